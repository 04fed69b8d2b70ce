use super::Session;
use crate::app::{AppBuilder, PanelApp};
use crate::keymap::KeyMap;
use anyhow::{anyhow, Result};
use crossbeam_channel::bounded;
use std::io::{BufRead, BufReader, ErrorKind, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// The device end of the socket, driven step by step from the test thread.
struct FakePanel {
    reader: BufReader<UnixStream>,
    writer: UnixStream,
}

impl FakePanel {
    fn new(stream: UnixStream) -> Self {
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        Self {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end_matches('\n').to_string()
    }

    /// Read the next command, check it, and acknowledge it.
    fn expect(&mut self, expected: &str) {
        let line = self.read_line();
        assert_eq!(line, expected);
        self.reply("ok");
    }

    fn reply(&mut self, line: &str) {
        self.writer.write_all(format!("{line}\n").as_bytes()).unwrap();
    }

    /// Simulate a remote-control button press.
    fn press(&mut self, code: &str) {
        self.reply(&format!("ir:{code}"));
    }

    /// Fail if the session has written anything we have not acknowledged yet.
    fn assert_idle(&mut self) {
        assert!(self.reader.buffer().is_empty(), "unexpected buffered command");
        let stream = self.reader.get_mut();
        stream.set_nonblocking(true).unwrap();
        let mut byte = [0u8; 1];
        let result = stream.read(&mut byte);
        stream.set_nonblocking(false).unwrap();
        match result {
            Err(err) => assert_eq!(err.kind(), ErrorKind::WouldBlock),
            Ok(n) => panic!("second command in flight ({n} bytes)"),
        }
    }
}

fn keymap() -> KeyMap {
    [("0:16", "up"), ("0:17", "down"), ("0:59", "menu"), ("0:37", "back")]
        .into_iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

fn spawn_session(app: PanelApp) -> (FakePanel, thread::JoinHandle<Result<()>>) {
    let (ours, theirs) = UnixStream::pair().unwrap();
    let reader = ours.try_clone().unwrap();
    let session = thread::spawn(move || Session::start(app, keymap(), reader, ours)?.run());
    (FakePanel::new(theirs), session)
}

fn started(app: AppBuilder) -> (FakePanel, thread::JoinHandle<Result<()>>) {
    let (mut panel, session) = spawn_session(app.build().unwrap());
    panel.expect("c");
    panel.expect("d:40");
    (panel, session)
}

/// Hang up and collect the error the session ended with.
fn hang_up(panel: FakePanel, session: thread::JoinHandle<Result<()>>) -> anyhow::Error {
    drop(panel);
    session.join().unwrap().unwrap_err()
}

#[test]
fn startup_resets_panel_before_anything_else() {
    let app = PanelApp::builder().brightness(7).build().unwrap();
    let (mut panel, session) = spawn_session(app);
    assert_eq!(panel.read_line(), "c");
    panel.assert_idle();
    panel.reply("ok");
    panel.expect("d:7");
    let err = hang_up(panel, session);
    assert_eq!(err.to_string(), "panel closed the connection");
}

#[test]
fn key_press_runs_handler_and_redraws_field() {
    let app = PanelApp::builder()
        .field("vol", 2, 1)
        .context("main")
        .key("up", |ctx| {
            let level: u32 = ctx.text("vol")?.parse().unwrap_or(0);
            ctx.update("vol", format!("{:02}", level + 1))?;
            Ok(())
        });
    let (mut panel, session) = started(app);

    panel.press("0:16");
    panel.expect("g:2:1");
    panel.expect("p:01");
    panel.press("0:16");
    panel.expect("g:3:1");
    panel.expect("p:2");
    panel.assert_idle();
    hang_up(panel, session);
}

#[test]
fn unknown_codes_and_unbound_keys_send_nothing() {
    let app = PanelApp::builder()
        .field("status", 0, 0)
        .context("main")
        .key("up", |ctx| {
            ctx.update("status", "up")?;
            Ok(())
        });
    let (mut panel, session) = started(app);

    panel.press("9:99");
    panel.press("0:17");
    panel.press("0:16");
    // Had either earlier press produced output it would arrive first.
    panel.expect("g:0:0");
    panel.expect("p:up");
    panel.assert_idle();
    hang_up(panel, session);
}

#[test]
fn malformed_and_foreign_packets_are_not_fatal() {
    let app = PanelApp::builder()
        .field("status", 0, 0)
        .context("main")
        .key("up", |ctx| {
            ctx.update("status", "alive")?;
            Ok(())
        });
    let (mut panel, session) = started(app);

    panel.reply("x");
    panel.reply("ir");
    panel.reply("ir-0:16");
    panel.reply("zz:1:2");
    panel.press("0:16");
    panel.expect("g:0:0");
    panel.expect("p:alive");
    hang_up(panel, session);
}

#[test]
fn handlers_switch_the_active_context() {
    let app = PanelApp::builder()
        .field("mode", 0, 0)
        .context("menu")
        .key("up", |ctx| {
            ctx.update("mode", "MENU")?;
            Ok(())
        })
        .key("back", |ctx| {
            ctx.set_context("main")?;
            Ok(())
        })
        .context("main")
        .key("menu", |ctx| {
            ctx.set_context("menu")?;
            ctx.update("mode", "menu")?;
            Ok(())
        });
    let (mut panel, session) = started(app);

    // "up" is only bound in the menu context, which is not active yet.
    panel.press("0:16");
    panel.press("0:59");
    panel.expect("g:0:0");
    panel.expect("p:menu");
    panel.press("0:16");
    panel.expect("g:0:0");
    panel.expect("p:MENU");
    panel.press("0:37");
    panel.press("0:16");
    panel.press("0:59");
    panel.expect("g:0:0");
    panel.expect("p:menu");
    panel.assert_idle();
    hang_up(panel, session);
}

#[test]
fn setup_hook_runs_before_keys() {
    let app = PanelApp::builder()
        .field("title", 1, 0)
        .context("main")
        .context("menu")
        .setup(|ctx| {
            assert!(ctx.key().is_none());
            ctx.set_context("main")?;
            ctx.update("title", "hi")?;
            Ok(())
        });
    let (mut panel, session) = started(app);
    panel.expect("g:1:0");
    panel.expect("p:hi");
    hang_up(panel, session);
}

#[test]
fn background_updates_arrive_in_order_one_at_a_time() {
    let app = PanelApp::builder().field("count", 0, 3).task("counter", |panel| {
        for i in 0..10 {
            panel.update("count", i.to_string())?;
        }
        Ok(())
    });
    let (mut panel, session) = started(app);

    for i in 0..10 {
        let line = panel.read_line();
        assert_eq!(line, "g:0:3");
        panel.assert_idle();
        panel.reply("ok");
        let line = panel.read_line();
        assert_eq!(line, format!("p:{i}"));
        panel.assert_idle();
        panel.reply("ok");
    }
    hang_up(panel, session);
}

#[test]
fn error_replies_only_pace_the_protocol() {
    let app = PanelApp::builder().field("a", 0, 0).task("writer", |panel| {
        panel.update("a", "x")?;
        panel.update("a", "y")?;
        Ok(())
    });
    let (mut panel, session) = started(app);
    assert_eq!(panel.read_line(), "g:0:0");
    panel.reply("error:bad command");
    assert_eq!(panel.read_line(), "p:x");
    panel.reply("fail:busy");
    panel.expect("g:0:0");
    panel.expect("p:y");
    hang_up(panel, session);
}

#[test]
fn handler_error_ends_the_session() {
    let app = PanelApp::builder()
        .context("main")
        .key("down", |_ctx| Err(anyhow!("volume knob missing")));
    let (mut panel, session) = started(app);
    panel.press("0:17");
    let err = session.join().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "handler for key down failed");
    assert!(format!("{err:#}").contains("volume knob missing"));
    drop(panel);
}

#[test]
fn task_error_ends_the_session() {
    let app = PanelApp::builder().task("clock", |_panel| Err(anyhow!("no time source")));
    let (panel, session) = started(app);
    let err = session.join().unwrap().unwrap_err();
    assert_eq!(err.to_string(), "task clock failed");
    drop(panel);
}

#[test]
fn task_touching_unknown_field_ends_the_session() {
    let app = PanelApp::builder().task("clock", |panel| {
        panel.update("clock", "12:00")?;
        Ok(())
    });
    let (panel, session) = started(app);
    let err = session.join().unwrap().unwrap_err();
    assert!(format!("{err:#}").contains("no such field clock"), "{err:#}");
    drop(panel);
}

#[test]
fn hang_up_during_startup_fails() {
    let app = PanelApp::builder().build().unwrap();
    let (mut panel, session) = spawn_session(app);
    assert_eq!(panel.read_line(), "c");
    let err = hang_up(panel, session);
    assert!(err.to_string().contains("in flight"), "{err}");
}

#[test]
fn handler_can_hand_work_to_a_thread() {
    let app = PanelApp::builder()
        .field("status", 0, 2)
        .context("main")
        .key("up", |ctx| {
            let panel = ctx.handle();
            thread::spawn(move || panel.update("status", "later"));
            Ok(())
        });
    let (mut panel, session) = started(app);
    panel.press("0:16");
    panel.expect("g:0:2");
    panel.expect("p:later");
    panel.assert_idle();
    hang_up(panel, session);
}

#[test]
fn inbound_flood_does_not_starve_queued_commands() {
    const FLOOD_LINES: usize = 20_000;
    let (go_tx, go_rx) = bounded::<()>(1);
    let app = PanelApp::builder().field("n", 0, 0).task("counter", move |panel| {
        go_rx.recv()?;
        for i in 0..5 {
            panel.update("n", i.to_string())?;
        }
        Ok(())
    });
    let (mut panel, session) = started(app);

    let mut flood_writer = panel.writer.try_clone().unwrap();
    let flood = thread::spawn(move || {
        for _ in 0..FLOOD_LINES {
            if flood_writer.write_all(b"ir:9:99\n").is_err() {
                break;
            }
        }
    });
    go_tx.send(()).unwrap();

    // Flood lines may stand in for replies; only the command order matters here.
    let mut received = Vec::new();
    for _ in 0..10 {
        received.push(panel.read_line());
        panel.reply("ok");
    }
    let expected: Vec<String> = (0..5)
        .flat_map(|i| ["g:0:0".to_string(), format!("p:{i}")])
        .collect();
    assert_eq!(received, expected);
    flood.join().unwrap();
    hang_up(panel, session);
}

#[test]
fn key_press_during_a_command_is_taken_as_its_reply() {
    let up_hits = Arc::new(AtomicUsize::new(0));
    let hits = Arc::clone(&up_hits);
    let app = PanelApp::builder()
        .field("a", 0, 0)
        .field("b", 0, 1)
        .context("main")
        .key("up", move |_ctx| {
            hits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .key("down", |ctx| {
            ctx.update("b", "y")?;
            Ok(())
        })
        .task("writer", |panel| {
            panel.update("a", "x")?;
            Ok(())
        });
    let (mut panel, session) = started(app);

    assert_eq!(panel.read_line(), "g:0:0");
    panel.press("0:16");
    // The press paced the first command, so the second goes out before any "ok".
    assert_eq!(panel.read_line(), "p:x");
    panel.reply("ok");
    // The late reply is seen as a stray packet and ignored.
    panel.reply("ok");
    panel.press("0:17");
    panel.expect("g:0:1");
    panel.expect("p:y");
    assert_eq!(up_hits.load(Ordering::SeqCst), 0);
    hang_up(panel, session);
}

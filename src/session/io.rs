use crossbeam_channel::Sender;
use std::io::{self, BufRead, BufReader, ErrorKind, Read};
use std::thread;

pub(super) type InboundLine = io::Result<String>;

/// Read newline-terminated lines from the panel and forward them to the event loop.
///
/// End-of-file drops the sender, so the loop sees a disconnected channel. A read
/// error is forwarded once and ends the thread.
pub(super) fn spawn_reader_thread<R>(
    reader: R,
    tx: Sender<InboundLine>,
) -> io::Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    thread::Builder::new()
        .name("irpanel-reader".into())
        .spawn(move || {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::with_capacity(64);
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(Ok(decode_line(&buf))).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => {
                        tracing::debug!("panel read error: {err}");
                        let _ = tx.send(Err(err));
                        break;
                    }
                }
            }
            tracing::debug!("panel reader finished");
        })
}

fn decode_line(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches(['\n', '\r']).to_string()
}

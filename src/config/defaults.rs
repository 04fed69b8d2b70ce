/// Key table looked up next to the working directory when `--keys` is not given.
pub const DEFAULT_KEYS_FILE: &str = "keys.csv";

/// Brightness sent at startup when neither the command line nor a layout sets one.
pub const DEFAULT_BRIGHTNESS: u8 = 40;

pub mod compiler;
pub mod config;
pub mod fetch;

#[macro_export]
macro_rules! println_pad {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        for __line in __s.lines() {
            println!("    {}", __line);
        }
    }};
}

/// Remove a directory tree if it exists.
pub fn remove_dir_if_exists(path: &camino::Utf8Path) -> std::io::Result<()> {
    if path.exists() {
        std::fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Write `contents` to `path`, creating parent directories as needed.
pub fn write_creating_parents(path: &camino::Utf8Path, contents: impl AsRef<[u8]>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

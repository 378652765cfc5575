// logging.rs — File logging for the injected DLL.
//
// There is no console inside the game process, so everything goes to a log
// file. By default the file sits next to the DLL itself (resolved from the
// module handle DllMain receives), falling back to the working directory.

use crate::config::{Config, DEFAULT_LOG_FILE};
use once_cell::sync::OnceCell;
use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

/// Module handle of this DLL, 0 until DllMain records it.
static MODULE_HANDLE: AtomicUsize = AtomicUsize::new(0);

/// Path of the active log file, set by the first successful `init`.
static LOG_PATH: OnceCell<PathBuf> = OnceCell::new();

pub fn set_module_handle(handle: usize) {
    MODULE_HANDLE.store(handle, Ordering::Relaxed);
}

/// `gta_native.log` in the DLL's directory.
pub fn default_log_path() -> PathBuf {
    module_dir()
        .map(|dir| dir.join(DEFAULT_LOG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

#[cfg(windows)]
fn module_dir() -> Option<PathBuf> {
    use winapi::um::libloaderapi::GetModuleFileNameA;

    let handle = MODULE_HANDLE.load(Ordering::Relaxed);
    if handle == 0 {
        return None;
    }
    let mut buf = [0u8; 512];
    let len = unsafe { GetModuleFileNameA(handle as _, buf.as_mut_ptr() as _, buf.len() as u32) } as usize;
    if len == 0 {
        return None;
    }
    let path = std::str::from_utf8(&buf[..len]).ok()?;
    std::path::Path::new(path).parent().map(PathBuf::from)
}

#[cfg(not(windows))]
fn module_dir() -> Option<PathBuf> {
    None
}

/// Start logging to the configured file. Later calls are no-ops and return
/// the path already in use.
pub fn init(config: &Config) -> std::io::Result<PathBuf> {
    LOG_PATH
        .get_or_try_init(|| {
            let path = config.log_file.clone().unwrap_or_else(default_log_path);
            let file = File::create(&path)?;
            let filter = EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

            // Another subscriber may already own the process (tests, host tools).
            let _ = fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(true)
                .try_init();

            tracing::info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "logging started");
            Ok(path)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_runs_once() {
        let dir = std::env::temp_dir().join(format!("gta_native_log_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let config = Config { log_file: Some(dir.join("a.log")), ..Config::default() };
        let first = init(&config).unwrap();
        assert!(first.exists());

        let other = Config { log_file: Some(dir.join("b.log")), ..Config::default() };
        assert_eq!(init(&other).unwrap(), first);
        assert!(!dir.join("b.log").exists());
    }

    #[test]
    fn default_path_without_module_is_relative() {
        assert_eq!(default_log_path().file_name().unwrap(), DEFAULT_LOG_FILE);
    }
}

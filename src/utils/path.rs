use std::borrow::Cow;
use std::env;
use std::path::PathBuf;

use log::error;

pub fn basename(path: &str) -> Cow<'_, str> {
    if path == "/" {
        return path.into();
    }
    let mut pieces = path.trim_end_matches('/').rsplit('/');
    match pieces.next() {
        Some(p) => p.into(),
        None => path.into(),
    }
}

pub fn current_dir() -> String {
    let current_dir = match env::current_dir() {
        Ok(x) => x,
        Err(e) => {
            error!("prompt: current_dir error: {}", e);
            return String::new();
        }
    };
    match current_dir.to_str() {
        Some(x) => x.to_string(),
        None => {
            error!("prompt: current_dir is not valid UTF-8");
            String::new()
        }
    }
}

pub fn home_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~").as_ref())
}

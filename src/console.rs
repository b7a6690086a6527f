use std::sync::OnceLock;

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

const RED: &str = "\x1b[91m";
const YELLOW: &str = "\x1b[93m";
const GREEN: &str = "\x1b[92m";
const RESET: &str = "\x1b[0m";

pub fn set_color(enabled: bool) {
    let _ = ENABLE_COLOR.set(enabled);
}

fn color_on() -> bool {
    ENABLE_COLOR.get().copied().unwrap_or(false)
}

fn tag(color: &str, label: &str, msg: &str) {
    if color_on() {
        println!("{}[{}]{} {}", color, label, RESET, msg);
    } else {
        println!("[{}] {}", label, msg);
    }
}

pub fn ok(msg: &str) {
    tag(GREEN, "OK", msg);
}

pub fn info(msg: &str) {
    tag(YELLOW, "INFO", msg);
}

pub fn warn(msg: &str) {
    tag(RED, "WARNING", msg);
}

pub fn error(msg: &str) {
    tag(RED, "ERROR", msg);
}

//! Compile-time defaults for every tunable, kept in one place so a
//! reviewer can see every knob's factory default without hunting through
//! the struct definitions.

pub fn default_port() -> u16 {
    3001
}

pub fn default_question_time_limit_ms() -> u64 {
    10_000
}

pub fn default_quiz_start_delay_ms() -> u64 {
    5_000
}

pub fn default_next_question_delay_ms() -> u64 {
    3_000
}

pub fn default_questions_per_quiz() -> u8 {
    10
}

pub fn default_max_connections_per_user() -> usize {
    3
}

pub fn default_rate_limit_window_ms() -> u64 {
    1_000
}

pub fn default_rate_limit_max() -> u32 {
    10
}

pub fn default_max_frame_bytes() -> usize {
    1024
}

pub fn default_cleanup_interval_secs() -> u64 {
    60
}

pub fn default_dead_room_retention_secs() -> i64 {
    30 * 60
}

pub fn default_shutdown_grace_secs() -> u64 {
    10
}

pub fn default_log_level() -> String {
    "info".to_string()
}

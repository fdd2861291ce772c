//! Restart schedules

/// Luby sequence scaled by `y`: `y^k` where `k` follows 0,0,1,0,0,1,2,...
#[must_use]
pub fn luby(y: f64, mut x: u64) -> f64 {
    let mut size: u64 = 1;
    let mut seq: i32 = 0;
    while size < x + 1 {
        seq += 1;
        size = 2 * size + 1;
    }
    while size - 1 != x {
        size = (size - 1) >> 1;
        seq -= 1;
        x %= size;
    }
    y.powi(seq)
}

/// Conflicts allowed before restart number `restart`
#[must_use]
pub fn restart_interval(first: u64, inc: f64, luby_restart: bool, restart: u64) -> u64 {
    let base = if luby_restart {
        luby(inc, restart)
    } else {
        inc.powi(restart.min(i32::MAX as u64) as i32)
    };
    (base * first as f64).min(u64::MAX as f64) as u64
}

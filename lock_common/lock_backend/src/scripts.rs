//! Define Lua scripts for the conditional lock operations

/// Lua script for releasing a lock
/// Can only delete the key when it exists and the value matches
pub const DELETE_IF_MATCH: &str = r#"
    if redis.call('get', KEYS[1]) == ARGV[1] then
        return redis.call('del', KEYS[1])
    end
    return 0
"#;

/// Lua script for extending a lock's expiration time
/// Can only refresh the TTL when the key exists and the value matches
pub const EXTEND_IF_MATCH: &str = r#"
    if redis.call('get', KEYS[1]) == ARGV[1] then
        return redis.call('pexpire', KEYS[1], ARGV[2])
    end
    return 0
"#;

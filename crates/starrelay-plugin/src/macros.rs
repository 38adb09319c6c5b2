//! Convenience macros for plugin development.

/// Macro for quickly building a `HookPayload`.
///
/// # Example
/// ```rust,ignore
/// let payload = hook_payload!({
///     "message" => json!("/who"),
///     "player" => json!("alice"),
/// });
/// ```
#[macro_export]
macro_rules! hook_payload {
    () => {
        $crate::hooks::definitions::HookPayload::new()
    };
    ({ $($key:expr => $value:expr),* $(,)? }) => {{
        let mut payload = $crate::hooks::definitions::HookPayload::new();
        $(
            payload.data.insert($key.to_string(), $value);
        )*
        payload
    }};
}

// Formatting helpers shared by the engine and any display shell.

/// Renders a number of seconds as `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_countdown(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Price with the five decimals usual for major FX quotes.
pub fn format_price(price: f64) -> String {
    format!("{:.5}", price)
}

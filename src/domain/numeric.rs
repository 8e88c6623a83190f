/// Pulls a number out of noisy scraped text like "$12,345.67 raised".
///
/// Everything that is not an ascii digit or a decimal point is dropped,
/// so currency symbols, thousands separators and trailing unit text all
/// disappear while digits keep their positions. Anything left over that
/// still fails to parse (including empty input) comes back as 0.
pub fn extract_number(text: &str) -> f64 {
    let clean: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    clean.parse::<f64>().unwrap_or(0.0)
}

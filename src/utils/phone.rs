/// Keeps the last four digits so log lines stay correlatable without
/// carrying the full number.
pub fn mask(phone: &str) -> String {
    let trimmed = phone.trim();
    let count = trimmed.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = trimmed.chars().skip(count - 4).collect();
    format!("***{}", tail)
}

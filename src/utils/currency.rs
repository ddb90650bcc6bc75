/// Currency utility functions for handling Ghana cedi conversions
///
/// All monetary values in the database are stored in pesewas
/// (1 GHS = 100 pesewas) to avoid floating-point precision issues.

/// Convert cedis to pesewas (multiply by 100)
pub fn cedis_to_pesewas(cedis: f64) -> i64 {
    (cedis * 100.0).round() as i64
}

/// Convert pesewas to cedis (divide by 100)
pub fn pesewas_to_cedis(pesewas: i64) -> f64 {
    pesewas as f64 / 100.0
}

/// Format pesewas as a GHS string with 2 decimal places
pub fn format_pesewas_as_cedis(pesewas: i64) -> String {
    format!("GHS {:.2}", pesewas_to_cedis(pesewas))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cedis_to_pesewas() {
        assert_eq!(cedis_to_pesewas(100.0), 10000);
        assert_eq!(cedis_to_pesewas(0.50), 50);
        assert_eq!(cedis_to_pesewas(19.50), 1950);
        assert_eq!(cedis_to_pesewas(36.50), 3650);
    }

    #[test]
    fn test_pesewas_to_cedis() {
        assert_eq!(pesewas_to_cedis(10000), 100.0);
        assert_eq!(pesewas_to_cedis(50), 0.50);
        assert_eq!(pesewas_to_cedis(1950), 19.50);
    }

    #[test]
    fn test_format_pesewas_as_cedis() {
        assert_eq!(format_pesewas_as_cedis(10000), "GHS 100.00");
        assert_eq!(format_pesewas_as_cedis(50), "GHS 0.50");
        assert_eq!(format_pesewas_as_cedis(3650), "GHS 36.50");
    }
}

//! 单位系统
//!
//! 画布内部统一以像素存储，只在导出时按“每厘米像素数”（PPC）换算为厘米。

/// 默认每厘米像素数
pub const DEFAULT_PPC: f64 = 50.0;

/// 像素换算为厘米
pub fn pixels_to_cm(value: f64, ppc: f64) -> f64 {
    value / ppc
}

/// 格式化导出数值：最多保留三位小数，去掉末尾的零，不输出 `-0`
pub fn format_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 || !rounded.is_finite() {
        return "0".to_string();
    }
    let text = format!("{:.3}", rounded);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    text.to_string()
}

/// 格式化以厘米为单位的长度
pub fn format_length(pixels: f64, ppc: f64) -> String {
    format!("{}cm", format_number(pixels_to_cm(pixels, ppc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixels_to_cm() {
        assert_eq!(pixels_to_cm(100.0, DEFAULT_PPC), 2.0);
        assert_eq!(pixels_to_cm(30.0, 20.0), 1.5);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.04), "0.04");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(1.23456), "1.235");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(f64::NAN), "0");
    }

    #[test]
    fn test_format_length() {
        assert_eq!(format_length(5.0, DEFAULT_PPC), "0.1cm");
    }
}

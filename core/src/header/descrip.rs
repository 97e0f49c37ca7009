use super::DescripMap;
use regex::Regex;
use std::sync::OnceLock;

/// Parses a header's free-form description string into timing values
///
/// Scanners export acquisition parameters as `name=value[unit]` fragments,
/// e.g. `"TE=30ms TR=2.5s"`. Recognized names are `te` (echo time) and `tr`
/// (repetition time); values are normalized to seconds. When the unit is
/// missing, a magnitude heuristic decides: echo times below 1 are taken as
/// seconds (else milliseconds), repetition times above 100 as milliseconds
/// (else seconds).
///
/// Unrecognized fragments are skipped; unparseable input yields an empty map.
pub fn parse_descrip(descrip: &str) -> DescripMap {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| {
        Regex::new(r"(?P<name>\w+)=(?P<value>(\d+(\.\d*)?|\.\d+)([eE][-+]?\d+)?)(?P<unit>s|ms|us)?")
            .expect("Failed to compile regex")
    });

    let mut descrip_map = DescripMap::new();

    for captures in re.captures_iter(descrip) {
        let name = captures["name"].to_lowercase();
        let value: f64 = match captures["value"].parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let unit = captures.name("unit").map(|m| m.as_str());

        let (key, unit) = match name.as_str() {
            "te" => (
                "echo_time",
                unit.unwrap_or(if value < 1.0 { "s" } else { "ms" }),
            ),
            "tr" => (
                "repetition_time",
                unit.unwrap_or(if value > 100.0 { "ms" } else { "s" }),
            ),
            _ => continue,
        };

        let seconds = match unit {
            "s" => value,
            "ms" => value * 1e-3,
            "us" => value * 1e-6,
            _ => continue,
        };

        descrip_map.insert(key.to_string(), seconds);
    }

    descrip_map
}

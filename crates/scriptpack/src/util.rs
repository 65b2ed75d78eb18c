//! Small helpers shared across the pipeline.

/// Remove all whitespace from a script name so it can be embedded in a
/// generated module alias.
pub fn strip_whitespace(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

/// File name for a script in the flat namespace.
pub fn script_file(name: &str, extension: &str) -> String {
    format!("{name}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_inner_and_outer_whitespace() {
        assert_eq!(strip_whitespace("Bundler UI"), "BundlerUI");
        assert_eq!(strip_whitespace(" Weather\tWidget "), "WeatherWidget");
        assert_eq!(strip_whitespace("Plain"), "Plain");
    }

    #[test]
    fn joins_name_and_extension() {
        assert_eq!(script_file("Main", "js"), "Main.js");
    }
}

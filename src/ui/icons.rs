pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✔";
    pub const CROSS: &str = "✘";
    pub const PACKAGE: &str = "📦";
}

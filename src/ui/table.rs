use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Unit")]
    pub unit: String,
    #[tabled(rename = "Enabled")]
    pub state: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, unit: &str, state: &str) {
        self.rows.push(TableRow {
            unit: unit.to_string(),
            state: state.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }
        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

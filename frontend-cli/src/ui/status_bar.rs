//! Status line showing process counts.

pub struct StatusBar;

impl StatusBar {
    pub fn render(total: usize, filtered_count: usize) -> String {
        let mut line = format!("Total processes: {}", total);
        if filtered_count != total {
            line.push_str(&format!(" | Filtered: {}", filtered_count));
        }
        line
    }
}

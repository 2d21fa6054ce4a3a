//! Header naming the operating system.

pub struct Header;

impl Header {
    pub fn render(os_name: &str, description: Option<&str>) -> String {
        match description {
            Some(long) if long != os_name => format!("Operating System: {} - {}", os_name, long),
            _ => format!("Operating System: {}", os_name),
        }
    }
}

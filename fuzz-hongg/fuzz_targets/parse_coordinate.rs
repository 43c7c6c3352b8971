use honggfuzz::fuzz;
use plc_marshal::{element_name, parse_coordinate};

fn main() {
    loop {
        fuzz!(|data: &[u8]| {
            let Ok(name) = std::str::from_utf8(data) else {
                return;
            };
            if let Ok(coordinate) = parse_coordinate(name) {
                let rebuilt = element_name("X", &coordinate);
                assert_eq!(parse_coordinate(&rebuilt).unwrap(), coordinate);
            }
        });
    }
}

use std::collections::HashMap;

use honggfuzz::fuzz;
use plc_marshal::{
    NonZeroBasedArray, SymbolInfo, SymbolTable, SymbolTreeWalker, Value, from_value, to_value,
};

fn main() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::structure("Obj", ["Flag", "Count", "Items"]));
    table.insert(SymbolInfo::leaf("Obj.Flag"));
    table.insert(SymbolInfo::leaf("Obj.Count"));
    table.insert_leaf_array("Obj.Items", &[0], &[3]).unwrap();
    let walker = SymbolTreeWalker::new(&table);
    let root = table.get("Obj").unwrap();

    loop {
        fuzz!(|data: &[u8]| {
            let Ok(value) = serde_json::from_slice::<Value>(data) else {
                return;
            };
            let _ = from_value::<HashMap<String, i64>>(value.clone());
            let _ = from_value::<Vec<Option<f64>>>(value.clone());
            let _ = from_value::<NonZeroBasedArray<Value>>(value.clone());
            let _ = from_value::<(bool, String, u8)>(value.clone());
            for pair in walker.flatten_with_value(root, &value) {
                let _ = pair;
            }
            if let Ok(again) = to_value(&value) {
                assert_eq!(again, value);
            }
        });
    }
}

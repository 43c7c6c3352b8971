//! Tests for flattening and assembling symbol trees

use plc_marshal::{
    Error, Members, MissingMemberPolicy, NonZeroBasedArray, SymbolInfo, SymbolResolver,
    SymbolTable, SymbolTreeWalker, Value, WalkConfig, to_value,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Obj {
    #[serde(rename = "Flag")]
    flag: bool,
    #[serde(rename = "Count")]
    count: i32,
    #[serde(rename = "Items")]
    items: Vec<i32>,
}

/// `Obj { Flag, Count, Items[0..3] }`
fn obj_table() -> SymbolTable {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::structure("Obj", ["Flag", "Count", "Items"]));
    table.insert(SymbolInfo::leaf("Obj.Flag").with_type_name("BOOL"));
    table.insert(SymbolInfo::leaf("Obj.Count").with_type_name("DINT"));
    table.insert_leaf_array("Obj.Items", &[0], &[3]).unwrap();
    table
}

fn obj_value() -> Value {
    to_value(&Obj {
        flag: true,
        count: 5,
        items: vec![9, 8, 7, 6],
    })
    .unwrap()
}

fn leaf_names<R: SymbolResolver>(walker: &SymbolTreeWalker<R>, root: &SymbolInfo) -> Vec<String> {
    walker
        .flatten(root)
        .map(|leaf| leaf.unwrap().name().to_owned())
        .collect()
}

#[test]
fn test_flatten_leaf_is_itself() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    let flag = table.get("Obj.Flag").unwrap();
    assert_eq!(leaf_names(&walker, flag), ["Obj.Flag"]);
}

#[test]
fn test_flatten_struct_with_array() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::composite("Root", ["A", "B"]));
    table.insert(SymbolInfo::leaf("A"));
    table.insert_leaf_array("B", &[0], &[3]).unwrap();

    let walker = SymbolTreeWalker::new(&table);
    let root = table.get("Root").unwrap();
    assert_eq!(
        leaf_names(&walker, root),
        ["A", "B[0]", "B[1]", "B[2]", "B[3]"]
    );
}

#[test]
fn test_flatten_is_idempotent() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    let root = table.get("Obj").unwrap();
    let first = leaf_names(&walker, root);
    let second = leaf_names(&walker, root);
    assert_eq!(first, second);
    assert_eq!(first.len(), 6);

    let iter = walker.flatten(root);
    let cloned: Vec<_> = iter.clone().map(|s| s.unwrap().name()).collect();
    let original: Vec<_> = iter.map(|s| s.unwrap().name()).collect();
    assert_eq!(cloned, original);
}

#[test]
fn test_flatten_nested_depth_first() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::structure("Line", ["Stations", "Speed"]));
    table.insert(SymbolInfo::array("Line.Stations", &[1], &[2]).unwrap());
    for station in ["Line.Stations[1]", "Line.Stations[2]"] {
        table.insert(SymbolInfo::structure(station, ["Id", "Busy"]));
        table.insert(SymbolInfo::leaf(format!("{station}.Id")));
        table.insert(SymbolInfo::leaf(format!("{station}.Busy")));
    }
    table.insert(SymbolInfo::leaf("Line.Speed"));

    let walker = SymbolTreeWalker::new(&table);
    assert_eq!(
        leaf_names(&walker, table.get("Line").unwrap()),
        [
            "Line.Stations[1].Id",
            "Line.Stations[1].Busy",
            "Line.Stations[2].Id",
            "Line.Stations[2].Busy",
            "Line.Speed",
        ]
    );
}

#[test]
fn test_flatten_unknown_child_ends_walk() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::structure("S", ["A", "Ghost", "C"]));
    table.insert(SymbolInfo::leaf("S.A"));
    table.insert(SymbolInfo::leaf("S.C"));

    let walker = SymbolTreeWalker::new(&table);
    let results: Vec<_> = walker.flatten(table.get("S").unwrap()).collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().name(), "S.A");
    assert_eq!(
        results[1].as_ref().unwrap_err(),
        &Error::SymbolNotFound("S.Ghost".into())
    );
}

#[test]
fn test_flatten_cycle_hits_depth_limit() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::composite("Loop", ["Loop"]));

    let walker = SymbolTreeWalker::with_config(&table, WalkConfig::default().with_max_depth(8));
    let results: Vec<_> = walker.flatten(table.get("Loop").unwrap()).collect();
    assert!(matches!(results.as_slice(), [Err(Error::DepthLimit(8))]));
}

#[test]
fn test_flatten_with_value_obj_scenario() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    let value = obj_value();

    let pairs: Vec<_> = walker
        .flatten_with_value(table.get("Obj").unwrap(), &value)
        .map(|pair| {
            let pair = pair.unwrap();
            (pair.symbol.name(), pair.value.clone())
        })
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("Obj.Flag", Value::Bool(true)),
            ("Obj.Count", Value::Int(5)),
            ("Obj.Items[0]", Value::Int(9)),
            ("Obj.Items[1]", Value::Int(8)),
            ("Obj.Items[2]", Value::Int(7)),
            ("Obj.Items[3]", Value::Int(6)),
        ]
    );
}

#[test]
fn test_flatten_object_owned_pairs() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    let obj = Obj {
        flag: false,
        count: -1,
        items: vec![1, 2, 3, 4],
    };
    let pairs = walker.flatten_object(table.get("Obj").unwrap(), &obj).unwrap();
    assert_eq!(pairs.len(), 6);
    assert_eq!(pairs[0].symbol.type_name(), Some("BOOL"));
    assert_eq!(pairs[0].value, Value::Bool(false));
    assert_eq!(pairs[5].symbol.name(), "Obj.Items[3]");
    assert_eq!(pairs[5].value, Value::Int(4));
}

#[test]
fn test_flatten_with_value_non_zero_based_array() {
    let mut table = SymbolTable::new();
    table.insert_leaf_array("Temps", &[1, -1], &[2, 0]).unwrap();

    let temps = NonZeroBasedArray::from_vec(
        vec![1.0.into(), 2.0.into(), 3.0.into(), 4.0.into()],
        &[2, 2],
        &[1, -1],
    )
    .unwrap();
    let value = Value::Array(temps);

    let walker = SymbolTreeWalker::new(&table);
    let pairs: Vec<_> = walker
        .flatten_with_value(table.get("Temps").unwrap(), &value)
        .map(|pair| {
            let pair = pair.unwrap();
            (pair.symbol.name().to_owned(), pair.value.as_f64().unwrap())
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("Temps[1,-1]".to_owned(), 1.0),
            ("Temps[1,0]".to_owned(), 2.0),
            ("Temps[2,-1]".to_owned(), 3.0),
            ("Temps[2,0]".to_owned(), 4.0),
        ]
    );
}

#[test]
fn test_null_member_skips_subtree() {
    #[derive(Serialize)]
    struct Partial {
        #[serde(rename = "Flag")]
        flag: Option<bool>,
        #[serde(rename = "Count")]
        count: i32,
        #[serde(rename = "Items")]
        items: Option<Vec<i32>>,
    }

    let table = obj_table();
    let value = to_value(&Partial {
        flag: None,
        count: 3,
        items: None,
    })
    .unwrap();

    for config in [WalkConfig::default(), WalkConfig::strict()] {
        let walker = SymbolTreeWalker::with_config(&table, config);
        let pairs: Vec<_> = walker
            .flatten_with_value(table.get("Obj").unwrap(), &value)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].symbol.name(), "Obj.Count");
    }
}

#[test]
fn test_null_root_yields_nothing() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    assert_eq!(
        walker
            .flatten_with_value(table.get("Obj").unwrap(), &Value::Null)
            .count(),
        0
    );
}

#[test]
fn test_missing_member_skipped_by_default() {
    let table = obj_table();
    let mut members = Members::new();
    members.insert("Flag".into(), Value::Bool(true));
    members.insert("Items".into(), Value::from(vec![1, 2, 3, 4]));
    let value = Value::Struct(members);

    let walker = SymbolTreeWalker::new(&table);
    assert_eq!(walker.config().missing_member, MissingMemberPolicy::Skip);
    let names: Vec<_> = walker
        .flatten_with_value(table.get("Obj").unwrap(), &value)
        .map(|pair| pair.unwrap().symbol.name())
        .collect();
    // Count is absent
    assert_eq!(
        names,
        [
            "Obj.Flag",
            "Obj.Items[0]",
            "Obj.Items[1]",
            "Obj.Items[2]",
            "Obj.Items[3]"
        ]
    );
}

#[test]
fn test_missing_member_fails_when_strict() {
    let table = obj_table();
    let mut members = Members::new();
    members.insert("Flag".into(), Value::Bool(true));
    members.insert("Cnt".into(), Value::Int(5));
    let value = Value::Struct(members);

    let walker = SymbolTreeWalker::with_config(&table, WalkConfig::strict());
    let results: Vec<_> = walker
        .flatten_with_value(table.get("Obj").unwrap(), &value)
        .collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1].as_ref().unwrap_err(),
        &Error::MissingMember("Obj.Count".into())
    );
}

#[test]
fn test_index_outside_array_fails() {
    let table = obj_table();
    let value = to_value(&Obj {
        flag: true,
        count: 1,
        items: vec![1, 2, 3],
    })
    .unwrap();

    for config in [WalkConfig::default(), WalkConfig::strict()] {
        let walker = SymbolTreeWalker::with_config(&table, config);
        let err = walker
            .flatten_object(table.get("Obj").unwrap(), &value)
            .unwrap_err();
        assert_eq!(
            err,
            Error::IndexOutOfRange {
                index: 3,
                lower: 0,
                upper: 2
            }
        );
    }
}

#[test]
fn test_shifted_bounds_fail_instead_of_dropping_elements() {
    let mut table = SymbolTable::new();
    table.insert_leaf_array("Speeds", &[1], &[3]).unwrap();
    let value = to_value(&vec![10, 20, 30]).unwrap();

    let walker = SymbolTreeWalker::new(&table);
    let results: Vec<_> = walker
        .flatten_with_value(table.get("Speeds").unwrap(), &value)
        .map(|pair| pair.map(|pair| (pair.symbol.name(), pair.value.clone())))
        .collect();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], Ok(("Speeds[1]", Value::Int(20))));
    assert_eq!(results[1], Ok(("Speeds[2]", Value::Int(30))));
    assert_eq!(
        results[2],
        Err(Error::IndexOutOfRange {
            index: 3,
            lower: 0,
            upper: 2
        })
    );
}

#[test]
fn test_coordinate_rank_mismatch_fails() {
    let mut table = SymbolTable::new();
    table.insert_leaf_array("Grid", &[0, 0], &[1, 1]).unwrap();
    // a vector of vectors is a rank 1 array of rank 1 arrays
    let value = to_value(&vec![vec![1, 2], vec![3, 4]]).unwrap();

    let walker = SymbolTreeWalker::new(&table);
    let results: Vec<_> = walker
        .flatten_with_value(table.get("Grid").unwrap(), &value)
        .collect();
    assert!(matches!(results.as_slice(), [Err(Error::Argument(_))]));
}

#[test]
fn test_bad_element_name_is_format_error() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::composite("Arr", ["Arr[x]"]));
    table.insert(SymbolInfo::leaf("Arr[x]"));

    let value = Value::from(vec![1]);
    let walker = SymbolTreeWalker::new(&table);
    let results: Vec<_> = walker
        .flatten_with_value(table.get("Arr").unwrap(), &value)
        .collect();
    assert!(matches!(results.as_slice(), [Err(Error::Format { .. })]));
}

#[test]
fn test_assemble_rebuilds_obj() {
    let table = obj_table();
    let walker = SymbolTreeWalker::new(&table);
    let root = table.get("Obj").unwrap();

    let written = obj_value();
    let leaves: Vec<_> = walker
        .flatten_with_value(root, &written)
        .map(|pair| pair.unwrap().to_owned_pair())
        .collect();

    let assembled = walker
        .assemble(root, |symbol| {
            leaves
                .iter()
                .find(|pair| pair.symbol.name() == symbol.name())
                .map(|pair| pair.value.clone())
        })
        .unwrap();
    assert_eq!(assembled, written);

    let obj: Obj = walker
        .read_object(root, |symbol| {
            leaves
                .iter()
                .find(|pair| pair.symbol == *symbol)
                .map(|pair| pair.value.clone())
        })
        .unwrap();
    assert_eq!(
        obj,
        Obj {
            flag: true,
            count: 5,
            items: vec![9, 8, 7, 6]
        }
    );
}

#[test]
fn test_assemble_keeps_array_bounds() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Recipe {
        #[serde(rename = "Steps")]
        steps: NonZeroBasedArray<u16>,
    }

    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::structure("Recipe", ["Steps"]));
    table.insert_leaf_array("Recipe.Steps", &[1], &[3]).unwrap();

    let walker = SymbolTreeWalker::new(&table);
    let recipe: Recipe = walker
        .read_object(table.get("Recipe").unwrap(), |symbol| {
            let name = symbol.name();
            let index = name[name.len() - 2..name.len() - 1].parse::<u64>().ok()?;
            Some(Value::UInt(index * 100))
        })
        .unwrap();
    assert_eq!(recipe.steps.lower_bounds(), &[1]);
    assert_eq!(recipe.steps.as_slice(), &[100, 200, 300]);
}

#[test]
fn test_assemble_missing_leaf() {
    let table = obj_table();
    let root = table.get("Obj").unwrap();
    let leaf_value = |symbol: &SymbolInfo| match symbol.name() {
        "Obj.Flag" => Some(Value::Bool(true)),
        name if name.starts_with("Obj.Items") => Some(Value::Int(0)),
        _ => None,
    };

    let lenient = SymbolTreeWalker::new(&table);
    let value = lenient.assemble(root, leaf_value).unwrap();
    assert_eq!(value.get("Count"), None);
    assert_eq!(value.get("Flag"), Some(&Value::Bool(true)));
    assert_eq!(
        lenient.read_object::<Obj, _>(root, leaf_value).unwrap_err(),
        Error::MissingMember("Count".into())
    );

    let strict = SymbolTreeWalker::with_config(&table, WalkConfig::strict());
    assert_eq!(
        strict.assemble(root, leaf_value).unwrap_err(),
        Error::MissingMember("Obj.Count".into())
    );
}

#[test]
fn test_assemble_cycle_hits_depth_limit() {
    let mut table = SymbolTable::new();
    table.insert(SymbolInfo::composite("Loop", ["Loop"]));

    let walker = SymbolTreeWalker::with_config(&table, WalkConfig::default().with_max_depth(4));
    assert_eq!(
        walker
            .assemble(table.get("Loop").unwrap(), |_| None)
            .unwrap_err(),
        Error::DepthLimit(4)
    );
}

#[test]
fn test_walker_over_shared_table() {
    use std::{sync::Arc, thread};

    let table = Arc::new(obj_table());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let walker = SymbolTreeWalker::new(Arc::clone(&table));
            thread::spawn(move || {
                let root = walker.resolver().resolve("Obj").unwrap();
                walker.flatten(root).count()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 6);
    }
}

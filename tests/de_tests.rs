//! Tests for deserializing host types out of Value

use std::collections::HashMap;

use plc_marshal::{Error, Members, NonZeroBasedArray, Value, ValueKind, from_value, to_value};
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

fn members<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Struct(
        entries
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect::<Members>(),
    )
}

#[test]
fn test_scalars() {
    assert!(from_value::<bool>(Value::Bool(true)).unwrap());
    assert_eq!(from_value::<i16>(Value::Int(-12)).unwrap(), -12);
    assert_eq!(from_value::<u32>(Value::Int(12)).unwrap(), 12);
    assert_eq!(from_value::<i64>(Value::UInt(12)).unwrap(), 12);
    assert_eq!(from_value::<f64>(Value::Float(0.25)).unwrap(), 0.25);
    assert_eq!(from_value::<f32>(Value::Int(3)).unwrap(), 3.0);
    assert_eq!(from_value::<String>(Value::from("abc")).unwrap(), "abc");
    assert_eq!(from_value::<char>(Value::from("z")).unwrap(), 'z');
}

#[test]
fn test_integer_out_of_range() {
    let err = from_value::<u8>(Value::Int(300)).unwrap_err();
    assert!(matches!(err, Error::Message(_)));
    let err = from_value::<u16>(Value::Int(-1)).unwrap_err();
    assert!(matches!(err, Error::Message(_)));
}

#[test]
fn test_type_mismatch() {
    assert_eq!(
        from_value::<bool>(Value::Int(1)).unwrap_err(),
        Error::TypeMismatch {
            expected: "bool",
            actual: ValueKind::Int
        }
    );
    assert_eq!(
        from_value::<String>(Value::Float(1.0)).unwrap_err(),
        Error::TypeMismatch {
            expected: "string",
            actual: ValueKind::Float
        }
    );
    assert!(matches!(
        from_value::<Vec<u8>>(Value::Bool(false)),
        Err(Error::TypeMismatch {
            actual: ValueKind::Bool,
            ..
        })
    ));
}

#[test]
fn test_struct() {
    let value = members([
        ("Flag", Value::Bool(true)),
        ("Count", Value::Int(42)),
        ("Items", Value::from(vec![10, 20, 30])),
    ]);
    let obj: Obj = from_value(value).unwrap();
    assert_eq!(
        obj,
        Obj {
            flag: true,
            count: 42,
            items: vec![10, 20, 30]
        }
    );
}

#[test]
fn test_struct_missing_member() {
    let value = members([("Flag", Value::Bool(true)), ("Items", Value::from(vec![1]))]);
    assert_eq!(
        from_value::<Obj>(value).unwrap_err(),
        Error::MissingMember("Count".into())
    );
}

#[test]
fn test_struct_ignores_unknown_members() {
    let value = members([
        ("Flag", Value::Bool(false)),
        ("Count", Value::Int(0)),
        ("Items", Value::from(Vec::<i32>::new())),
        ("Spare", Value::from("unused")),
    ]);
    assert!(from_value::<Obj>(value).is_ok());
}

#[test]
fn test_optional_members() {
    #[derive(Deserialize, Debug, PartialEq)]
    struct Limits {
        low: Option<i32>,
        high: Option<i32>,
        #[serde(default)]
        hysteresis: u8,
    }

    let limits: Limits = from_value(members([("low", Value::Int(1)), ("high", Value::Null)])).unwrap();
    assert_eq!(
        limits,
        Limits {
            low: Some(1),
            high: None,
            hysteresis: 0
        }
    );
}

#[test]
fn test_round_trip_struct() {
    let obj = Obj {
        flag: false,
        count: -7,
        items: vec![3, 2, 1],
    };
    let back: Obj = from_value(to_value(&obj).unwrap()).unwrap();
    assert_eq!(back, obj);
}

#[test]
fn test_round_trip_nested_arrays_of_structs() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Axis {
        position: f64,
        homed: bool,
    }
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Machine {
        axes: Vec<Axis>,
        grid: Vec<Vec<u8>>,
        tags: HashMap<String, String>,
    }

    let machine = Machine {
        axes: vec![
            Axis {
                position: 1.25,
                homed: true,
            },
            Axis {
                position: -4.0,
                homed: false,
            },
        ],
        grid: vec![vec![1, 2], vec![3, 4]],
        tags: HashMap::from([("line".to_owned(), "A".to_owned())]),
    };
    let back: Machine = from_value(to_value(&machine).unwrap()).unwrap();
    assert_eq!(back, machine);
}

#[test]
fn test_round_trip_non_zero_based_member() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Recipe {
        name: String,
        steps: NonZeroBasedArray<u16>,
        matrix: NonZeroBasedArray<i8>,
    }

    let recipe = Recipe {
        name: "rinse".into(),
        steps: NonZeroBasedArray::from_vec(vec![5, 10, 15], &[3], &[1]).unwrap(),
        matrix: NonZeroBasedArray::from_vec(vec![1, -1, 2, -2], &[2, 2], &[-1, 1]).unwrap(),
    };
    let value = to_value(&recipe).unwrap();
    assert_eq!(
        value.get("matrix").and_then(|m| m.get([0, 2])),
        Some(&Value::Int(-2))
    );
    let back: Recipe = from_value(value).unwrap();
    assert_eq!(back, recipe);
}

#[test]
fn test_enums() {
    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    enum Mode {
        Auto,
        Manual(u8),
        Jog { speed: i16 },
    }

    assert_eq!(from_value::<Mode>(Value::from("Auto")).unwrap(), Mode::Auto);
    assert_eq!(from_value::<Mode>(Value::Int(0)).unwrap(), Mode::Auto);
    assert_eq!(
        from_value::<Mode>(members([("Manual", Value::UInt(9))])).unwrap(),
        Mode::Manual(9)
    );
    let jog = Mode::Jog { speed: -20 };
    assert_eq!(from_value::<Mode>(to_value(&jog).unwrap()).unwrap(), jog);

    assert!(from_value::<Mode>(Value::from("Off")).is_err());
    assert!(from_value::<Mode>(Value::Int(-1)).is_err());
    assert!(from_value::<Mode>(members([])).is_err());
}

#[test]
fn test_tuple() {
    let value = Value::from(vec![Value::Int(1), Value::from("two")]);
    let (one, two): (i32, String) = from_value(value).unwrap();
    assert_eq!((one, two.as_str()), (1, "two"));
}

#[test]
fn test_value_from_value() {
    let value = members([("a", Value::from(vec![1u8, 2]))]);
    let back: Value = from_value(value.clone()).unwrap();
    assert_eq!(back, value);
}

#[test]
fn test_value_from_json() {
    let value: Value = serde_json::from_str(r#"{"Flag": true, "Count": -3, "Items": [1, 2]}"#).unwrap();
    assert_eq!(value.get("Count"), Some(&Value::Int(-3)));
    let obj: Obj = from_value(value).unwrap();
    assert_eq!(obj.items, vec![1, 2]);
}

#[test]
fn test_value_to_json() {
    let value = members([("Speed", Value::Float(1.5)), ("Items", Value::from(vec![1u8]))]);
    assert_eq!(
        serde_json::to_string(&value).unwrap(),
        r#"{"Items":[1],"Speed":1.5}"#
    );
}

//! Tests for coordinate enumeration and index suffix parsing

use std::collections::HashSet;

use plc_marshal::{CoordinateCursor, Error, element_name, enumerate, parse_coordinate};

#[test]
fn test_enumerate_three_dimensions_is_complete() {
    let all: Vec<_> = enumerate(&[0, 0, 0], &[2, 2, 2]).unwrap().collect();
    assert_eq!(all.len(), 27);
    assert_eq!(all.first().unwrap(), &vec![0, 0, 0]);
    assert_eq!(all.last().unwrap(), &vec![2, 2, 2]);

    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(unique.len(), 27);
}

#[test]
fn test_enumerate_last_dimension_fastest() {
    let all: Vec<_> = enumerate(&[0, 0], &[1, 1]).unwrap().collect();
    assert_eq!(all, vec![vec![0, 0], vec![0, 1], vec![1, 0], vec![1, 1]]);
}

#[test]
fn test_enumerate_non_zero_and_negative_bounds() {
    let all: Vec<_> = enumerate(&[-1, 5], &[0, 6]).unwrap().collect();
    assert_eq!(all, vec![vec![-1, 5], vec![-1, 6], vec![0, 5], vec![0, 6]]);
}

#[test]
fn test_enumerate_single_dimension() {
    let all: Vec<_> = enumerate(&[1], &[4]).unwrap().collect();
    assert_eq!(all, vec![vec![1], vec![2], vec![3], vec![4]]);
}

#[test]
fn test_enumerate_rank_zero_is_empty() {
    assert_eq!(enumerate(&[], &[]).unwrap().count(), 0);
}

#[test]
fn test_enumerate_empty_dimension_is_empty() {
    assert_eq!(enumerate(&[0, 3], &[4, 2]).unwrap().count(), 0);
    assert_eq!(enumerate(&[1], &[0]).unwrap().count(), 0);
}

#[test]
fn test_enumerate_rank_mismatch() {
    let err = enumerate(&[0, 0], &[1]).unwrap_err();
    assert!(matches!(err, Error::Argument(_)));
}

#[test]
fn test_enumerate_exact_size() {
    let mut coordinates = enumerate(&[0, 0], &[2, 3]).unwrap();
    assert_eq!(coordinates.len(), 12);
    coordinates.next();
    coordinates.next();
    assert_eq!(coordinates.len(), 10);
    assert_eq!(coordinates.size_hint(), (10, Some(10)));
}

#[test]
fn test_enumerate_is_restartable() {
    let first: Vec<_> = enumerate(&[1, 1], &[2, 3]).unwrap().collect();
    let second: Vec<_> = enumerate(&[1, 1], &[2, 3]).unwrap().collect();
    assert_eq!(first, second);

    let coordinates = enumerate(&[1, 1], &[2, 3]).unwrap();
    let cloned: Vec<_> = coordinates.clone().collect();
    assert_eq!(cloned, coordinates.collect::<Vec<_>>());
}

#[test]
fn test_enumerate_is_fused() {
    let mut coordinates = enumerate(&[0], &[0]).unwrap();
    assert_eq!(coordinates.next(), Some(vec![0]));
    assert_eq!(coordinates.next(), None);
    assert_eq!(coordinates.next(), None);
}

#[test]
fn test_enumerate_at_integer_limits() {
    let all: Vec<_> = enumerate(&[i32::MIN], &[i32::MIN + 1]).unwrap().collect();
    assert_eq!(all, vec![vec![i32::MIN], vec![i32::MIN + 1]]);

    let all: Vec<_> = enumerate(&[i32::MAX - 1], &[i32::MAX]).unwrap().collect();
    assert_eq!(all, vec![vec![i32::MAX - 1], vec![i32::MAX]]);
}

#[test]
fn test_enumerate_rejects_uncountable_range() {
    assert!(matches!(
        enumerate(&[i32::MIN; 3], &[i32::MAX; 3]),
        Err(Error::Argument(_))
    ));
    assert!(matches!(
        CoordinateCursor::new(&[i32::MIN; 2], &[i32::MAX; 2]),
        Err(Error::Argument(_))
    ));

    // an empty dimension makes the whole range empty before anything overflows
    let empty = enumerate(&[i32::MIN, 0, i32::MIN], &[i32::MAX, -1, i32::MAX]).unwrap();
    assert_eq!(empty.len(), 0);
}

#[test]
fn test_cursor_matches_enumerate() {
    let mut cursor = CoordinateCursor::new(&[0, 1, 2], &[1, 2, 3]).unwrap();
    assert_eq!(cursor.rank(), 3);
    assert_eq!(cursor.remaining(), 8);

    let mut seen = Vec::new();
    while let Some(coordinate) = cursor.advance() {
        seen.push(coordinate.to_vec());
    }
    assert_eq!(seen, enumerate(&[0, 1, 2], &[1, 2, 3]).unwrap().collect::<Vec<_>>());
    assert_eq!(cursor.remaining(), 0);
    assert!(cursor.advance().is_none());
}

#[test]
fn test_cursor_rank_mismatch() {
    assert!(matches!(
        CoordinateCursor::new(&[0], &[1, 1]),
        Err(Error::Argument(_))
    ));
}

#[test]
fn test_parse_coordinate_two_components() {
    assert_eq!(parse_coordinate("X[5,3]").unwrap(), vec![5, 3]);
}

#[test]
fn test_parse_coordinate_one_component() {
    assert_eq!(parse_coordinate("X[5]").unwrap(), vec![5]);
}

#[test]
fn test_parse_coordinate_negative_and_whitespace() {
    assert_eq!(parse_coordinate("Block.Arr[ -2 , 7 ]").unwrap(), vec![-2, 7]);
}

#[test]
fn test_parse_coordinate_uses_trailing_group() {
    assert_eq!(parse_coordinate("Line[1].Axis[2,4]").unwrap(), vec![2, 4]);
}

#[test]
fn test_parse_coordinate_does_not_check_bounds() {
    assert_eq!(parse_coordinate("X[2147483647]").unwrap(), vec![i32::MAX]);
}

#[test]
fn test_parse_coordinate_rejects_non_integer() {
    match parse_coordinate("X[5,a]").unwrap_err() {
        Error::Format { input, reason } => {
            assert_eq!(input, "X[5,a]");
            assert_eq!(reason, "index is not an integer");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_parse_coordinate_format_errors() {
    let cases = [
        ("X", "no index suffix"),
        ("X[5", "missing closing bracket"),
        ("X[5]a", "characters after closing bracket"),
        ("X[]", "empty index"),
        ("X[1,,2]", "empty index"),
        ("X[99999999999]", "index is not an integer"),
    ];
    for (input, expected) in cases {
        match parse_coordinate(input) {
            Err(Error::Format { reason, .. }) => assert_eq!(reason, expected, "{input}"),
            other => panic!("{input}: unexpected result {other:?}"),
        }
    }
}

#[test]
fn test_element_name() {
    assert_eq!(element_name("Obj.Items", &[0]), "Obj.Items[0]");
    assert_eq!(element_name("M", &[-1, 2, 30]), "M[-1,2,30]");
}

#[test]
fn test_element_name_parses_back() {
    for coordinate in enumerate(&[-2, 0], &[1, 2]).unwrap() {
        let name = element_name("Grid", &coordinate);
        assert_eq!(parse_coordinate(&name).unwrap(), coordinate);
    }
}

use super::table::SymbolTable;
use crate::code::TableKind;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_fresh_table_maps_operands_to_themselves() {
    let table = SymbolTable::new(TableKind::Names, &names(&["a", "b", "c"]), 0);
    assert_eq!(table.get(1), Some("b"));
    assert!(!table.has(3));
    assert_eq!(table.remapped(2), Some(2));
    assert_eq!(table.names(), names(&["a", "b", "c"]));
}

#[test]
fn test_delete_then_recompute_compacts_in_order() {
    let mut table = SymbolTable::new(TableKind::Names, &names(&["a", "b", "c", "d"]), 0);
    assert_eq!(table.delete(1).as_deref(), Some("b"));
    assert_eq!(table.delete(1), None, "double delete is a no-op");
    table.recompute_remap();
    assert_eq!(table.remapped(0), Some(0));
    assert_eq!(table.remapped(1), None);
    assert_eq!(table.remapped(2), Some(1));
    assert_eq!(table.remapped(3), Some(2));
    assert_eq!(table.names(), names(&["a", "c", "d"]));

    // Surviving new operands form 0..k without gaps.
    let mut new: Vec<usize> = table.slots().filter_map(|(op, _)| table.remapped(op)).collect();
    new.sort();
    assert_eq!(new, (0..table.len()).collect::<Vec<_>>());
}

#[test]
fn test_offset_translates_operands() {
    // Two cell variables come before the free variables in operand space.
    let mut table = SymbolTable::new(TableKind::Free, &names(&["x", "y", "z"]), 2);
    assert_eq!(table.get(0), None, "cell operands are not free slots");
    assert_eq!(table.get(2), Some("x"));
    assert_eq!(table.get(4), Some("z"));
    table.delete(2);
    table.recompute_remap();
    assert_eq!(table.remapped(3), Some(2), "remap is based at the offset");
    assert_eq!(table.remapped(4), Some(3));
    let slots: Vec<(usize, &str)> = table.slots().collect();
    assert_eq!(slots, vec![(3, "y"), (4, "z")]);
}

#[test]
fn test_inlined_bookkeeping_is_independent_of_deletion() {
    let mut table = SymbolTable::new(TableKind::Names, &names(&["a", "b"]), 0);
    table.mark_inlined(1, 5);
    assert_eq!(table.inlined(1), Some(5));
    assert_eq!(table.inlined(0), None);
    assert!(table.has(1), "marking does not delete");
    let shown = table.to_string();
    assert!(shown.contains("1=k5"), "{}", shown);
}

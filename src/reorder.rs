/// Move the element at `from` so it lands immediately before the element
/// that originally sat at `to`.
///
/// Removing `from` shifts every later index down by one, so a forward move
/// inserts at `to - 1`; a backward move inserts at `to` unchanged. Returns
/// false, leaving the list untouched, when the indices are equal or either
/// is out of bounds.
pub fn move_item<T>(list: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= list.len() || to >= list.len() {
        return false;
    }

    let item = list.remove(from);
    let insert_at = if from < to { to - 1 } else { to };
    list.insert(insert_at, item);
    true
}

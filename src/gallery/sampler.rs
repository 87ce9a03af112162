// bounded subsets of large album listings

use super::types::Limit;

/// cut `list` down to what the caller asked for.
///
/// a plain limit keeps the first `n` entries. a distributed limit walks the
/// list at a fixed stride of `len / n` starting from index 0, so a preview of
/// a huge album covers all of it instead of its first few files.
pub fn sample<T>(list: Vec<T>, limit: Limit, distributed: bool) -> Vec<T> {
    let count = match limit {
        Limit::All => return list,
        Limit::Invalid => return Vec::new(),
        Limit::Take(count) => count,
    };

    if !distributed {
        let mut list = list;
        list.truncate(count);
        return list;
    }

    let stride = if count >= list.len() {
        1
    } else {
        list.len() / count
    };
    if stride == 0 {
        return Vec::new();
    }

    list.into_iter().step_by(stride).take(count).collect()
}

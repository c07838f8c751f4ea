use std::collections::HashMap;
use std::hash::Hash;

/// Counts how many disks reported exactly `err`.
pub fn count_err<E: PartialEq>(errs: &[Option<E>], err: &E) -> usize {
    errs.iter().fold(0, |acc, e| match e {
        Some(e) if e == err => acc + 1,
        _ => acc,
    })
}

/// Returns the most frequent outcome among `errs` and how many disks share it.
///
/// `None` stands for success. Errors listed in `ignored_errs` are not counted.
/// On a tie, success is preferred over any error.
pub fn reduce_errs<E>(errs: &[Option<E>], ignored_errs: &[E]) -> (usize, Option<E>)
where
    E: Eq + Hash + Clone,
{
    let mut err_counts: HashMap<Option<&E>, usize> = HashMap::new();
    for err in errs {
        if let Some(err) = err {
            if ignored_errs.contains(err) {
                continue;
            }
        }
        *err_counts.entry(err.as_ref()).or_default() += 1;
    }

    let mut max = 0usize;
    let mut max_err = None;
    // Iterate in slot order so that ties between errors resolve deterministically.
    for err in errs {
        let err = err.as_ref();
        let count = match err_counts.get(&err) {
            Some(count) => *count,
            None => continue,
        };
        if max < count {
            max = count;
            max_err = err;
        } else if max == count && err.is_none() {
            // Prefer `None` over other error values with the same
            // number of occurrences.
            max_err = None;
        }
    }
    (max, max_err.cloned())
}

/// Reduces `errs` and returns the winning outcome only when it reaches `quorum`.
///
/// `Ok(None)` means success reached quorum, `Ok(Some(err))` means `err` did,
/// `Err(count)` means no single outcome got there; `count` is the best count seen.
pub fn reduce_quorum_errs<E>(
    errs: &[Option<E>],
    ignored_errs: &[E],
    quorum: usize,
) -> Result<Option<E>, usize>
where
    E: Eq + Hash + Clone,
{
    let (max_count, max_err) = reduce_errs(errs, ignored_errs);
    if max_count >= quorum {
        return Ok(max_err);
    }
    Err(max_count)
}

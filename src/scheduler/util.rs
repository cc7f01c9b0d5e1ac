use std::collections::HashSet;

pub(super) fn unique_in_order<'a, I>(names: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    names.into_iter().filter(|n| seen.insert(*n)).collect()
}


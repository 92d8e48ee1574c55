use std::io;

const MEMINFO: &str = "/proc/meminfo";

/// Extracts `Hugepagesize` in bytes from `/proc/meminfo` text.
pub fn parse_hugepage_size(meminfo: &str) -> Option<usize> {
    let line = meminfo
        .lines()
        .find(|l| l.starts_with("Hugepagesize:"))?;
    let mut fields = line["Hugepagesize:".len()..].split_whitespace();
    let value: usize = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") => value.checked_mul(1024),
        None => Some(value),
        Some(_) => None,
    }
}

/// Huge page size of this host, `None` where the kernel does not report one.
pub fn huge_page_size() -> io::Result<Option<usize>> {
    match std::fs::read_to_string(MEMINFO) {
        Ok(text) => Ok(parse_hugepage_size(&text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Rounds `n` up to a multiple of `align`. `align == 0` leaves `n` unchanged.
pub fn round_up(n: usize, align: usize) -> usize {
    if align == 0 {
        return n;
    }
    n.div_ceil(align).saturating_mul(align)
}

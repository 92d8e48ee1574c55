/// Decimal rendering of one byte: up to three ASCII digits plus their count.
#[derive(Copy, Clone)]
pub(crate) struct Digits {
    bytes: [u8; 3],
    len: u8,
}

impl Digits {
    #[inline(always)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

const fn digits(n: u8) -> Digits {
    if n >= 100 {
        Digits {
            bytes: [b'0' + n / 100, b'0' + n / 10 % 10, b'0' + n % 10],
            len: 3,
        }
    } else if n >= 10 {
        Digits {
            bytes: [b'0' + n / 10, b'0' + n % 10, 0],
            len: 2,
        }
    } else {
        Digits {
            bytes: [b'0' + n, 0, 0],
            len: 1,
        }
    }
}

const fn build() -> [Digits; 256] {
    let mut table = [Digits { bytes: [0; 3], len: 0 }; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = digits(i as u8);
        i += 1;
    }
    table
}

pub(crate) static DECIMAL: [Digits; 256] = build();

use std::fmt::{self, Display};

/// Formats a count with `,` between groups of three digits.
pub struct Thousands(pub u64);

impl Display for Thousands {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.to_string();
        let lead = match digits.len() % 3 {
            0 => 3,
            lead => lead,
        };
        formatter.write_str(&digits[..lead])?;
        let mut rest = &digits[lead..];
        while !rest.is_empty() {
            let (group, tail) = rest.split_at(3);
            write!(formatter, ",{group}")?;
            rest = tail;
        }
        Ok(())
    }
}

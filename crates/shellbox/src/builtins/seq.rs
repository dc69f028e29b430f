//! seq builtin

use async_trait::async_trait;

use super::{Builtin, Context};
use crate::error::Result;

/// The seq builtin - print a number sequence.
///
/// Usage: `seq LAST`, `seq FIRST LAST`, `seq FIRST INCREMENT LAST`.
pub struct Seq;

#[async_trait]
impl Builtin for Seq {
    async fn run(&self, ctx: Context<'_>) -> Result<i32> {
        let numbers: Vec<i64> = match ctx
            .args
            .iter()
            .map(|a| a.parse::<i64>())
            .collect::<std::result::Result<Vec<_>, _>>()
        {
            Ok(numbers) => numbers,
            Err(_) => {
                ctx.stderr.write_text("seq: invalid number\n")?;
                return Ok(1);
            }
        };

        let (first, increment, last) = match numbers.as_slice() {
            [last] => (1, 1, *last),
            [first, last] => (*first, 1, *last),
            [first, increment, last] => (*first, *increment, *last),
            _ => {
                ctx.stderr
                    .write_text("seq: expected 1 to 3 arguments\n")?;
                return Ok(1);
            }
        };
        if increment == 0 {
            ctx.stderr.write_text("seq: increment must not be 0\n")?;
            return Ok(1);
        }

        let mut output = String::new();
        let mut n = first;
        while (increment > 0 && n <= last) || (increment < 0 && n >= last) {
            output.push_str(&format!("{}\n", n));
            n += increment;
        }
        ctx.stdout.write_text(&output)?;
        Ok(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::builtins::testutil::run;

    #[tokio::test]
    async fn test_seq_last_only() {
        let (_, out, _) = run(&Seq, &["3"], "").await;
        assert_eq!(out, "1\n2\n3\n");
    }

    #[tokio::test]
    async fn test_seq_first_last() {
        let (_, out, _) = run(&Seq, &["2", "4"], "").await;
        assert_eq!(out, "2\n3\n4\n");
    }

    #[tokio::test]
    async fn test_seq_with_increment() {
        let (_, out, _) = run(&Seq, &["1", "2", "7"], "").await;
        assert_eq!(out, "1\n3\n5\n7\n");
    }

    #[tokio::test]
    async fn test_seq_descending() {
        let (_, out, _) = run(&Seq, &["3", "-1", "1"], "").await;
        assert_eq!(out, "3\n2\n1\n");
    }

    #[tokio::test]
    async fn test_seq_empty_range() {
        let (exit, out, _) = run(&Seq, &["5", "1"], "").await;
        assert_eq!(exit, 0);
        assert_eq!(out, "");
    }

    #[tokio::test]
    async fn test_seq_bad_number() {
        let (exit, _, err) = run(&Seq, &["x"], "").await;
        assert_eq!(exit, 1);
        assert!(!err.is_empty());
    }
}

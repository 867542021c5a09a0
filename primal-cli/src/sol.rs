//! SOL format output.

use std::io::Write;

use primal_core::Mip;

/// Write a solution in SOL format: a comment line with the objective value
/// followed by one `<name> <value>` line per nonzero variable.
pub fn write_sol(out: &mut impl Write, mip: &Mip, sol: &[f64]) -> std::io::Result<()> {
    writeln!(out, "=obj= {}", mip.objective_value(sol))?;
    for (name, &value) in mip.var_names().iter().zip(sol) {
        if value != 0.0 {
            writeln!(out, "{name} {value}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use primal_core::{MipBuilder, VarType};

    use super::*;

    #[test]
    fn test_nonzeros_only() {
        let mut b = MipBuilder::new();
        let x = b.add_var("x", VarType::Binary, 0.0, 1.0, 2.0);
        let y = b.add_var("y", VarType::Binary, 0.0, 1.0, 1.0);
        b.add_row("r", 0.0, 2.0, &[(x, 1.0), (y, 1.0)]);
        let mip = b.build().unwrap();

        let mut buffer = Vec::new();
        write_sol(&mut buffer, &mip, &[1.0, 0.0]).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(text, "=obj= 2\nx 1\n");
    }
}

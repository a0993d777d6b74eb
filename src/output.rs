//! Writer for the plain result format: elapsed seconds, roll length, then one
//! `left top right bottom` line per placed rectangle.

use std::io::{self, Write};

use crate::types::Solution;

pub fn write_solution<W: Write>(out: &mut W, solution: &Solution) -> io::Result<()> {
    writeln!(out, "{:.1}", solution.elapsed_secs)?;
    writeln!(out, "{}", solution.length)?;
    for p in &solution.placements {
        writeln!(out, "{} {} {} {}", p.left(), p.top(), p.right(), p.bottom())?;
    }
    Ok(())
}

pub fn format_solution(solution: &Solution) -> String {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = write_solution(&mut buf, solution);
    String::from_utf8_lossy(&buf).into_owned()
}

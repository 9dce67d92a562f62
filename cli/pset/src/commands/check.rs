//! `pset check`: parse only and report what was found.

use std::path::Path;

use anyhow::{bail, Result};

use crate::config::PsetConfig;

pub fn run(config: &PsetConfig, file: &Path) -> Result<()> {
    println!("{}", render(config, file)?);
    Ok(())
}

/// Summary line, or an error if any reference went unresolved.
pub fn render(config: &PsetConfig, file: &Path) -> Result<String> {
    let document = super::load_document(file, &config.parse)?;
    super::report(file, &document);

    let bindings = document.bindings();
    let named = bindings.iter().filter(|b| b.name.is_some()).count();
    let prolog = bindings.iter().filter(|b| b.value.in_prolog).count();
    let diagnostics = document.diagnostics().len();
    if diagnostics > 0 {
        bail!(
            "{}: {diagnostics} unresolved reference(s)",
            file.display()
        );
    }
    Ok(format!(
        "{}: ok ({} bindings, {named} named, {prolog} in prolog, {} deferred)",
        file.display(),
        bindings.len(),
        document.deferred().len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::source_file;

    #[test]
    fn clean_document() {
        let (_dir, file) = source_file("BEGIN_PROLOG p: 1 END_PROLOG a: p b: a@DB 7");
        let out = render(&PsetConfig::default(), &file).unwrap();
        assert!(out.ends_with("ok (4 bindings, 3 named, 1 in prolog, 1 deferred)"));
    }

    #[test]
    fn unresolved_reference_fails() {
        let (_dir, file) = source_file("a: nowhere");
        let err = render(&PsetConfig::default(), &file).unwrap_err();
        assert!(err.to_string().contains("1 unresolved reference"));
    }

    #[test]
    fn syntax_error_fails() {
        let (_dir, file) = source_file("a: {");
        let err = render(&PsetConfig::default(), &file).unwrap_err();
        assert!(format!("{err:#}").contains("unterminated table"));
    }
}

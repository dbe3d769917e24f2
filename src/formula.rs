//! Homebrew formula generation for kpf.
//!
//! The formula installs the pinned release from PyPI into a private
//! virtualenv rather than building the sdist, so only the homepage, source
//! URL, checksum and version vary between releases.

use crate::error::{FormulaError, Result};
use crate::release::ReleaseMetadata;
use std::fs;
use std::path::Path;

/// Renders the kpf formula for a release.
///
/// Pure: the same metadata always produces byte-identical text. Values are
/// substituted verbatim, so a `"` inside any of them yields broken Ruby.
pub fn render(metadata: &ReleaseMetadata) -> String {
    format!(
        r##"class Kpf < Formula
  include Language::Python::Virtualenv

  desc "Kubernetes utility to improve kubectl port-forward reliability and usability"
  homepage "{homepage}"
  url "{url}"
  sha256 "{sha256}"
  license "MIT"

  depends_on "python@3.12"

  def install
    virtualenv_create(libexec, "python3.12")

    # Install kpf and its dependencies directly from PyPI using wheels
    system libexec/"bin/python", "-m", "pip", "install", "kpf=={version}"

    bin.install_symlink libexec/"bin/kpf"

    generate_completions_from_executable(bin/"kpf", "--completions")
  end

  test do
    assert_match "A better Kubectl Port-Forward", shell_output("#{{bin}}/kpf --help")

    version_output = shell_output("#{{bin}}/kpf --version")
    assert_match "kpf {version}", version_output
  end
end
"##,
        homepage = metadata.homepage,
        url = metadata.url,
        sha256 = metadata.sha256,
        version = metadata.version,
    )
}

/// Render the formula and write it to `path`, creating parent directories.
pub fn write_formula(metadata: &ReleaseMetadata, path: &Path) -> Result<()> {
    let io_err = |source| FormulaError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, render(metadata)).map_err(io_err)?;

    tracing::debug!(path = %path.display(), version = %metadata.version, "wrote formula");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::DESCRIPTION;

    fn metadata(version: &str) -> ReleaseMetadata {
        ReleaseMetadata {
            version: version.to_string(),
            url: format!("https://files.pythonhosted.org/packages/kpf-{version}.tar.gz"),
            sha256: "bad1f4671d313f3c4ea4603ee44c18f426477f090bcd1de3138b23941300d37a".to_string(),
            homepage: "https://github.com/jessegoodier/kpf".to_string(),
            description: DESCRIPTION.to_string(),
        }
    }

    #[test]
    fn render_substitutes_header_fields() {
        let formula = render(&metadata("0.1.10"));

        assert!(formula.starts_with("class Kpf < Formula\n"));
        assert!(formula.contains("homepage \"https://github.com/jessegoodier/kpf\""));
        assert!(formula.contains(
            "url \"https://files.pythonhosted.org/packages/kpf-0.1.10.tar.gz\""
        ));
        assert!(formula.contains(
            "sha256 \"bad1f4671d313f3c4ea4603ee44c18f426477f090bcd1de3138b23941300d37a\""
        ));
        assert!(formula.ends_with("end\n"));
    }

    #[test]
    fn render_pins_version_in_install_and_test() {
        let formula = render(&metadata("0.2.3"));

        assert!(formula.contains("\"kpf==0.2.3\""));
        assert!(formula.contains("assert_match \"kpf 0.2.3\", version_output"));
    }

    #[test]
    fn render_keeps_ruby_interpolation_literal() {
        let formula = render(&metadata("1.0.0"));

        assert!(formula.contains("shell_output(\"#{bin}/kpf --help\")"));
        assert!(formula.contains("shell_output(\"#{bin}/kpf --version\")"));
    }

    #[test]
    fn render_installs_symlink_and_completions() {
        let formula = render(&metadata("1.0.0"));

        assert!(formula.contains("bin.install_symlink libexec/\"bin/kpf\""));
        assert!(formula.contains("generate_completions_from_executable"));
        assert!(formula.contains("depends_on \"python@3.12\""));
    }

    #[test]
    fn render_is_deterministic() {
        let metadata = metadata("0.1.10");
        assert_eq!(render(&metadata), render(&metadata.clone()));
    }

    #[test]
    fn write_formula_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Formula").join("kpf.rb");

        write_formula(&metadata("0.1.10"), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render(&metadata("0.1.10")));
    }

    #[test]
    fn write_formula_reports_the_failing_path() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("Formula");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = write_formula(&metadata("0.1.10"), &blocker.join("kpf.rb")).unwrap_err();
        assert!(matches!(err, FormulaError::Io { ref path, .. } if path.ends_with("kpf.rb")));
    }
}

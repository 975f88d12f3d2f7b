//! TypeScript language support via ast-grep-language.

pub use ast_grep_language::SupportLang;

/// Get the TypeScript language for ast-grep operations.
pub fn typescript() -> SupportLang {
    SupportLang::TypeScript
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast_grep_core::AstGrep;

    #[test]
    fn typescript_lang_parses() {
        let sg = AstGrep::new("const x: number = 1;", typescript());
        assert_eq!(sg.root().kind(), "program");
    }

    #[test]
    fn typescript_lang_regex_literal() {
        let sg = AstGrep::new("if (ok) /`/.test(s);", typescript());
        let root = sg.root();

        let regexes: Vec<_> = root.dfs().filter(|n| n.kind() == "regex").collect();
        assert_eq!(regexes.len(), 1);
        assert!(root.dfs().all(|n| n.kind() != "template_string"));
    }

    #[test]
    fn typescript_lang_member_call() {
        let sg = AstGrep::new("await prisma.comment.create({ data: {} })", typescript());
        let root = sg.root();

        assert!(root.find("$C.comment.create($$$ARGS)").is_some());
    }
}

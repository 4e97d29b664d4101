#[cfg(test)]
mod vm_tests {
    use crate::vm;

    // Helper to compile and run source, then assert the result.
    fn test_source(source: &str, expected: f64) {
        let result = vm::interpret(source).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_vm_simple_expressions() {
        test_source("1.0", 1.0);
        test_source("(1 + 2) - 4", -1.0);
        test_source("10 / (2 * 2.5)", 2.0);
    }

    #[test]
    fn test_vm_precedence() {
        test_source("1 + 2 * 3", 7.0);
        test_source("(1 + 2) * 3", 9.0);
        test_source("8 / 4 / 2", 1.0);
        test_source("10 - 4 - 3", 3.0);
    }

    #[test]
    fn test_vm_unary() {
        test_source("-3", -3.0);
        test_source("--3", 3.0);
        test_source("-(1 + 2) * 2", -6.0);
        test_source("2 - -2", 4.0);
    }

    #[test]
    fn test_vm_comments_and_newlines() {
        test_source("1 + // one\n2 // two\n", 3.0);
    }

    #[test]
    fn test_vm_errors_keep_their_class() {
        let err = vm::interpret("(1 + 2").unwrap_err();
        assert!(err.is_compile_error());

        let err = vm::interpret("1\n/\n(2 - 2)").unwrap_err();
        assert!(err.is_runtime_error());
        assert!(err.to_string().contains("[line 2]"));
    }
}

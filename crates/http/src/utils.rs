/// Returns early with `$error` unless `$predicate` holds.
///
/// ```ignore
/// ensure!(headers.len() < limits.max_headers, ParseError::too_many_headers(limits.max_headers));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

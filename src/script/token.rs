/// Split one script line into tokens.
///
/// The line is first split on `"`. Segments at even positions sit outside
/// any quote pair and are whitespace-split with empties discarded; segments
/// at odd positions sit inside a pair and survive as exactly one verbatim
/// token. A trailing unterminated quote behaves as if the pair extended to
/// end of line.
pub fn split_tokens(line: &str) -> Vec<String> {
    line.split('"')
        .enumerate()
        .flat_map(|(position, segment)| {
            if position % 2 == 0 {
                segment
                    .split_whitespace()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            } else {
                vec![segment.to_string()]
            }
        })
        .collect()
}

use regex::Regex;
use crate::XpsError;

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SWEEPS: &str = "\
# Region: C 1s
#
# Cycle: 0, Curve: 0, Scan: 1
#
290.0  410
289.9  415
289.8  433

# Pass Energy: 20
300.0  1
#
290.0\t402
289.9\t418
289.8\t441";

    #[test]
    fn extract_blocks_in_file_order() {
        let blocks = DataBlockExtractor::new().unwrap().extract(TWO_SWEEPS);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line, 5);
        assert_eq!(blocks[0].n_lines(), 3);
        assert_eq!(blocks[1].line, 12);
        // last block runs to end of input
        assert_eq!(blocks[1].text, "290.0\t402\n289.9\t418\n289.8\t441");
    }

    #[test]
    fn numeric_line_must_follow_bare_marker() {
        let blocks = DataBlockExtractor::new().unwrap().extract("# Pass Energy: 20\n1.0 2.0\n#\n# Cycle: 0\n3.0 4.0\n");
        assert!(blocks.is_empty());
    }

    #[test]
    fn block_stops_at_non_numeric_line() {
        let blocks = DataBlockExtractor::new().unwrap().extract("#\n1.0 2.0\n1.5 2.5\n# Region: next\n2.0 3.0\n");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].n_lines(), 2);
    }

    #[test]
    fn parse_tab_and_space_pairs() {
        let blocks = DataBlockExtractor::new().unwrap().extract(TWO_SWEEPS);
        let sweep = blocks[1].parse().unwrap();
        assert_eq!(sweep.x, vec![290.0, 289.9, 289.8]);
        assert_eq!(sweep.y, vec![402.0, 418.0, 441.0]);
        assert_eq!(sweep.len(), 3);
    }

    #[test]
    fn malformed_line_reports_source_line() {
        let blocks = DataBlockExtractor::new().unwrap().extract("#\n1.0 2.0\n1.5 2.5 3.5\n");
        match blocks[0].parse() {
            Err(XpsError::MalformedDataLine { line, found }) => {
                assert_eq!(line, 3);
                assert_eq!(found, 3);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn unparsable_number() {
        let blocks = DataBlockExtractor::new().unwrap().extract("#\n1.0 2.0\n1..5 2.5\n");
        match blocks[0].parse() {
            Err(XpsError::ParseFloat { line, token, .. }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "1..5");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn cursor_consumes_in_order() {
        let blocks = DataBlockExtractor::new().unwrap().extract(TWO_SWEEPS);
        let mut cursor = BlockCursor::new(blocks);
        assert_eq!(cursor.len(), 2);
        assert_eq!(cursor.next_block().map(|b| b.line), Some(5));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.next_block().map(|b| b.line), Some(12));
        assert!(cursor.next_block().is_none());
        assert_eq!(cursor.position(), 2);
        assert_eq!(cursor.remaining(), 0);
    }
}

/// Raw text of one sweep's numeric data, exactly as it appears in the export.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    pub text: String,
    /// 1-based line number of the first data line
    pub line: usize,
}

/// One decoded sweep: energy axis and intensities, same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sweep {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Sweep {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

impl DataBlock {

    fn start(raw_line: &str, line: usize) -> Self {
        DataBlock { text: raw_line.to_string(), line }
    }

    fn push_line(&mut self, raw_line: &str) {
        self.text.push('\n');
        self.text.push_str(raw_line);
    }

    pub fn n_lines(&self) -> usize {
        self.text.lines().count()
    }

    /// Decode the block into (energy, intensity) pairs, one per line.
    pub fn parse(&self) -> Result<Sweep, XpsError> {
        let n = self.n_lines();
        let mut sweep = Sweep { x: Vec::with_capacity(n), y: Vec::with_capacity(n) };
        for (offset, raw_line) in self.text.lines().enumerate() {
            let line = self.line + offset;
            let tokens: Vec<&str> = raw_line.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err(XpsError::MalformedDataLine { line, found: tokens.len() });
            }
            sweep.x.push(parse_float(tokens[0], line)?);
            sweep.y.push(parse_float(tokens[1], line)?);
        }
        Ok(sweep)
    }
}

fn parse_float(token: &str, line: usize) -> Result<f64, XpsError> {
    token.parse::<f64>().map_err(|source| XpsError::ParseFloat {
        line,
        token: token.to_string(),
        source,
    })
}

/// Finds the numeric runs that follow a bare `#` line.
#[derive(Debug)]
pub struct DataBlockExtractor {
    numeric_line: Regex,
}

impl DataBlockExtractor {

    pub fn new() -> Result<Self, XpsError> {
        Ok(DataBlockExtractor { numeric_line: Regex::new(r"^[0-9.\s]+$")? })
    }

    fn is_numeric(&self, raw_line: &str) -> bool {
        !raw_line.trim().is_empty() && self.numeric_line.is_match(raw_line)
    }

    /// All data blocks of `text`, in file order.
    pub fn extract(&self, text: &str) -> Vec<DataBlock> {
        let mut blocks = Vec::new();
        let mut current: Option<DataBlock> = None;
        let mut after_marker = false;

        for (i, raw_line) in text.lines().enumerate() {
            let numeric = self.is_numeric(raw_line);
            match current.as_mut() {
                Some(block) if numeric => block.push_line(raw_line),
                _ => {
                    // a blank or non-numeric line closes the open block
                    if let Some(block) = current.take() {
                        blocks.push(block);
                    }
                    if after_marker && numeric {
                        current = Some(DataBlock::start(raw_line, i + 1));
                    }
                }
            }
            after_marker = raw_line.trim_end() == "#";
        }

        if let Some(block) = current {
            blocks.push(block);
        }
        blocks
    }
}

/// Read position into the data blocks of one file. Blocks are handed out strictly in file
/// order and never reused.
#[derive(Debug, Clone)]
pub struct BlockCursor {
    blocks: Vec<DataBlock>,
    next: usize,
}

impl BlockCursor {

    pub fn new(blocks: Vec<DataBlock>) -> Self {
        BlockCursor { blocks, next: 0 }
    }

    /// hands out the next unconsumed block and advances
    pub fn next_block(&mut self) -> Option<&DataBlock> {
        let block = self.blocks.get(self.next)?;
        self.next += 1;
        Some(block)
    }

    /// number of blocks consumed so far
    pub fn position(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> usize {
        self.blocks.len() - self.next
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

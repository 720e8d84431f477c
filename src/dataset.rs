use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const CATEGORY_COLUMN: &str = "category";
pub const QUESTION_COLUMN: &str = "question";
pub const OPTIONS_COLUMN: &str = "options";
pub const ANSWER_COLUMN: &str = "answer";

#[derive(Debug)]
pub enum DatasetError {
    MissingColumn(String),
    AnswerCountMismatch { rows: usize, answers: usize },
    TooManyFields { line: u64, fields: usize, expected: usize },
    Csv(csv::Error),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DatasetError::MissingColumn(name) => {
                write!(f, "Missing required column: {}", name)
            }
            DatasetError::AnswerCountMismatch { rows, answers } => write!(
                f,
                "Got {} answers for {} rows; refusing to write a misaligned table",
                answers, rows
            ),
            DatasetError::TooManyFields {
                line,
                fields,
                expected,
            } => write!(
                f,
                "Line {} has {} fields, expected at most {}",
                line, fields, expected
            ),
            DatasetError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        DatasetError::Csv(e)
    }
}

/// One question as read from the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    /// Value of the first column, passed through untouched.
    pub id: String,
    pub category: String,
    pub question: String,
    /// Serialized option list, e.g. `['3', '4', '5']`.
    pub options: String,
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndexes {
    category: usize,
    question: usize,
    options: usize,
}

/// An input table held in memory. Every column is kept verbatim so the
/// output can reproduce it with the answers attached.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: StringRecord,
    records: Vec<StringRecord>,
    columns: ColumnIndexes,
}

impl Dataset {
    pub fn read(path: &Path) -> Result<Self, DatasetError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let dataset = Self::from_csv_reader(reader)?;
        info!(
            "Loaded {} rows from {}",
            dataset.records.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: io::Read>(rdr: R) -> Result<Self, DatasetError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        Self::from_csv_reader(reader)
    }

    fn from_csv_reader<R: io::Read>(
        mut reader: csv::Reader<R>,
    ) -> Result<Self, DatasetError> {
        let headers = reader.headers()?.clone();
        let columns = resolve_columns(&headers)?;
        let records = reader
            .records()
            .map(|record| pad_record(record?, headers.len()))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            "Dataset columns: {:?}",
            headers.iter().collect::<Vec<_>>()
        );
        Ok(Self {
            headers,
            records,
            columns,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The question rows in file order.
    pub fn rows(&self) -> Vec<QuestionRow> {
        // Records are padded to the header width on load
        let field =
            |record: &StringRecord, index: usize| record[index].to_string();

        self.records
            .iter()
            .map(|record| QuestionRow {
                id: field(record, 0),
                category: field(record, self.columns.category),
                question: field(record, self.columns.question),
                options: field(record, self.columns.options),
            })
            .collect()
    }

    /// Writes the table to `path` with an `answer` column, replacing any
    /// existing file.
    pub fn write_with_answers(
        &self,
        path: &Path,
        answers: &[i64],
    ) -> Result<(), DatasetError> {
        let writer = WriterBuilder::new().from_path(path)?;
        self.write_csv(writer, answers)?;
        info!("Wrote {} rows to {}", answers.len(), path.display());
        Ok(())
    }

    pub fn write_to<W: io::Write>(
        &self,
        wtr: W,
        answers: &[i64],
    ) -> Result<(), DatasetError> {
        self.write_csv(WriterBuilder::new().from_writer(wtr), answers)
    }

    fn write_csv<W: io::Write>(
        &self,
        mut writer: csv::Writer<W>,
        answers: &[i64],
    ) -> Result<(), DatasetError> {
        if answers.len() != self.records.len() {
            return Err(DatasetError::AnswerCountMismatch {
                rows: self.records.len(),
                answers: answers.len(),
            });
        }

        // An existing answer column is overwritten in place.
        let existing = self.headers.iter().position(|h| h == ANSWER_COLUMN);

        let mut headers = self.headers.clone();
        if existing.is_none() {
            headers.push_field(ANSWER_COLUMN);
        }
        writer.write_record(&headers)?;

        for (record, answer) in self.records.iter().zip(answers) {
            let answer = answer.to_string();
            let row: StringRecord = match existing {
                Some(index) => record
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        if i == index {
                            answer.as_str()
                        } else {
                            value
                        }
                    })
                    .collect(),
                None => {
                    let mut row = record.clone();
                    row.push_field(&answer);
                    row
                }
            };
            writer.write_record(&row)?;
        }

        writer.flush().map_err(|e| DatasetError::Csv(e.into()))?;
        Ok(())
    }
}

/// Short rows get empty trailing fields, the way a dataframe fills missing
/// cells. Rows wider than the header are rejected.
fn pad_record(
    mut record: StringRecord,
    width: usize,
) -> Result<StringRecord, DatasetError> {
    if record.len() > width {
        return Err(DatasetError::TooManyFields {
            line: record.position().map_or(0, |p| p.line()),
            fields: record.len(),
            expected: width,
        });
    }
    while record.len() < width {
        record.push_field("");
    }
    Ok(record)
}

fn resolve_columns(
    headers: &StringRecord,
) -> Result<ColumnIndexes, DatasetError> {
    if headers.is_empty() {
        return Err(DatasetError::MissingColumn(
            "identifier (first column)".to_string(),
        ));
    }

    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    };

    Ok(ColumnIndexes {
        category: find(CATEGORY_COLUMN)?,
        question: find(QUESTION_COLUMN)?,
        options: find(OPTIONS_COLUMN)?,
    })
}

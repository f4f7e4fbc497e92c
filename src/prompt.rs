//! Console prompts collecting a city, a filter and yes/no decisions.
//!
//! Each prompt repeats until the answer is usable; recoverable errors from the
//! core are printed and the question is asked again.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use crate::city::City;
use crate::config::DataConfig;
use crate::data::filter::FilteredView;

pub struct Prompter<R, W> {
    input: R,
    output: W,
    config: DataConfig,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W, config: DataConfig) -> Self {
        Self {
            input,
            output,
            config,
        }
    }

    /// Ask the question and return the trimmed answer. Fails on end of input.
    fn ask(&mut self, question: &str) -> Result<String> {
        writeln!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = self.input.read_line(&mut line).context("reading answer")?;
        if read == 0 {
            bail!("input closed");
        }
        Ok(line.trim().to_string())
    }

    fn say(&mut self, message: impl std::fmt::Display) -> Result<()> {
        writeln!(self.output, "{message}")?;
        Ok(())
    }

    /// Keep asking for a city until one loads.
    pub fn choose_city(&mut self) -> Result<City> {
        loop {
            let answer = self.ask("Which city's bikeshare data would you like to explore?")?;
            match City::new(&answer, &self.config) {
                Ok(city) => {
                    self.say(format_args!("{} bikeshare data has been loaded!", city.name()))?;
                    return Ok(city);
                }
                Err(e) if e.is_retryable() => self.say(&e)?,
                Err(e) => return Err(e).with_context(|| format!("loading {answer}")),
            }
        }
    }

    /// Keep asking for months and days until the city accepts the filter.
    pub fn choose_filter<'c>(&mut self, city: &'c mut City) -> Result<&'c FilteredView> {
        let month_question = format!(
            "{}'s bikeshare program has data for the first 6 months of 2017. \
             Which months would you like to explore?\n\
             (enter 1-6)(separate multiple months with spaces)(enter 'all' for every month)",
            city.name()
        );
        loop {
            let months = self.ask(&month_question)?;
            let days = self.ask(
                "Which days would you like to explore?\n\
                 (enter 0-6, where 0 is Monday)(separate multiple days with spaces)\
                 (enter 'all' for every day)",
            )?;
            match city.filter(&months, &days) {
                Ok(_) => break,
                Err(e) if e.is_retryable() => self.say(&e)?,
                Err(e) => return Err(e.into()),
            }
        }
        city.filtered_view().context("filter was not applied")
    }

    /// Ask a y/n question until the answer is y or n.
    pub fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        loop {
            let answer = self.ask(&format!("{question} (y/n)"))?;
            match answer.to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => self.say("Not a valid response. Please enter y or n.")?,
            }
        }
    }

    pub fn confirm_rerun(&mut self) -> Result<bool> {
        self.ask_yes_no("Would you like to rerun the program?")
    }

    /// Offer to print the filtered rows as JSON lines.
    pub fn offer_raw_data(&mut self, city: &City) -> Result<()> {
        if !self.ask_yes_no("Would you like to see the raw data?")? {
            return Ok(());
        }
        for trip in city.raw_rows()? {
            let line = serde_json::to_string(trip)?;
            self.say(line)?;
        }
        Ok(())
    }

    /// Write arbitrary text, e.g. a rendered report.
    pub fn show(&mut self, text: &str) -> Result<()> {
        write!(self.output, "{text}")?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    const CSV: &str = "Start Time,End Time,Trip Duration,Start Station,End Station\n\
                       2017-01-02 09:00:00,2017-01-02 09:10:00,600,A,B\n\
                       2017-02-07 10:00:00,2017-02-07 10:05:00,300,B,A\n";

    fn prompter(dir: &std::path::Path, answers: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        let config = DataConfig::new(dir, crate::config::SourceFormat::Csv);
        Prompter::new(Cursor::new(answers.as_bytes().to_vec()), Vec::new(), config)
    }

    fn output(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_output()).unwrap()
    }

    #[test]
    fn reprompts_until_city_exists() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("new_york_city.csv"), CSV).unwrap();

        let mut p = prompter(dir.path(), "gotham\nNew York City\n");
        let city = p.choose_city().unwrap();
        assert_eq!(city.name(), "New York City");

        let text = output(p);
        assert!(text.contains("gotham does not have a corresponding data file"));
        assert!(text.contains("New York City bikeshare data has been loaded!"));
    }

    #[test]
    fn reprompts_until_filter_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chicago.csv"), CSV).unwrap();

        let mut p = prompter(dir.path(), "chicago\n9\nall\n2\nall\n");
        let mut city = p.choose_city().unwrap();
        let view = p.choose_filter(&mut city).unwrap();
        assert_eq!(view.rows(), &[1]);
        assert!(output(p).contains("'9' is not a valid filter input"));
    }

    #[test]
    fn yes_no_rejects_other_answers() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter(dir.path(), "maybe\nY\n");
        assert!(p.confirm_rerun().unwrap());
        assert!(output(p).contains("Please enter y or n."));
    }

    #[test]
    fn end_of_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = prompter(dir.path(), "");
        assert!(p.ask_yes_no("Continue?").is_err());
    }

    #[test]
    fn raw_data_prints_one_line_per_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chicago.csv"), CSV).unwrap();

        let mut p = prompter(dir.path(), "chicago\nall\nall\ny\n");
        let mut city = p.choose_city().unwrap();
        p.choose_filter(&mut city).unwrap();
        p.offer_raw_data(&city).unwrap();

        let text = output(p);
        let rows: Vec<_> = text.lines().filter(|l| l.starts_with('{')).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("\"trip_label\":\"A to B\""));
    }
}

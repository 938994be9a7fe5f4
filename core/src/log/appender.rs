use super::consts::LOG_LINE_PATTERN_COLORED;
use log::LevelFilter;
use log4rs::{
    append::{Append, console::ConsoleAppender},
    config::Appender,
    encode::pattern::PatternEncoder,
    filter::{Filter, threshold::ThresholdFilter},
};

pub(super) struct AppenderSpec {
    pub name: &'static str,
    level: Option<LevelFilter>,
    append: Box<dyn Append>,
}

impl AppenderSpec {
    pub fn console(name: &'static str, level: Option<LevelFilter>) -> Self {
        let console = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN_COLORED))).build();
        Self { name, level, append: Box::new(console) }
    }

    pub fn appender(self) -> Appender {
        let filters = self.level.map(|x| Box::new(ThresholdFilter::new(x)) as Box<dyn Filter>);
        Appender::builder().filters(filters).build(self.name, self.append)
    }
}

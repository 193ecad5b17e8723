use crate::model::ReplayModel;
use crate::orchestrator::Event;

#[derive(Debug, Clone)]
pub enum Message {
    OpenImage,
    DetectObjects,
    Pipeline(Event<ReplayModel>),
    None,
}

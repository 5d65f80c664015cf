//! Cross-module scenarios: the coordinator driving the frame cycle and
//! dispatching input against mock or in-process collaborators

mod support;

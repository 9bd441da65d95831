//! Workflow-level tests driving the controller against scripted collaborators.

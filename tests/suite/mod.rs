mod context_holder;
mod editor_flow;
mod outbox;
mod preferences;
mod timeline;

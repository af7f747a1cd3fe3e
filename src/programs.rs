pub mod auto_adjust;
pub mod manual_override;
pub mod preset;
pub mod transition;

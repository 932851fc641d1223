pub mod gemini_provider;
pub mod mock_provider;

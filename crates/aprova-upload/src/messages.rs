//! User-facing notification texts.

use aprova_core::constants::BYTES_PER_MB;

pub const UPLOAD_SUCCEEDED: &str = "Arquivo enviado com sucesso!";
pub const UPLOAD_FAILED: &str = "Erro ao fazer upload do arquivo";
pub const DUPLICATE_OBJECT: &str = "Já existe um arquivo com este nome. Tente enviar novamente.";
pub const FILE_DELETED: &str = "Arquivo removido com sucesso";
pub const DELETE_FAILED: &str = "Erro ao remover arquivo";

/// Size in megabytes with two decimals, e.g. `"114.44 MB"`.
pub fn format_file_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / BYTES_PER_MB as f64)
}

/// Message for a file refused by the storage-wide object ceiling.
pub fn storage_ceiling_exceeded(file_size: u64, limit: u64) -> String {
    format!(
        "O arquivo ({}) excede o limite máximo de {}MB",
        format_file_size(file_size),
        limit / BYTES_PER_MB
    )
}

/// Summary for a batch where some files were skipped.
pub fn batch_summary(uploaded: usize, total: usize) -> String {
    format!("{} de {} arquivos enviados", uploaded, total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats_megabytes_with_two_decimals() {
        assert_eq!(format_file_size(120_000_000), "114.44 MB");
        assert_eq!(format_file_size(0), "0.00 MB");
        assert_eq!(format_file_size(BYTES_PER_MB), "1.00 MB");
    }

    #[test]
    fn test_ceiling_message_names_size_and_limit() {
        let message = storage_ceiling_exceeded(120_000_000, 100 * BYTES_PER_MB);
        assert_eq!(
            message,
            "O arquivo (114.44 MB) excede o limite máximo de 100MB"
        );
    }

    #[test]
    fn test_batch_summary_text() {
        assert_eq!(batch_summary(2, 3), "2 de 3 arquivos enviados");
    }
}

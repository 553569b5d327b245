//! Classification prompt construction.

use crate::core::scanner::FileRecord;

const INSTRUCTIONS: &str = "\
Anda adalah asisten AI yang membantu mengelompokkan file berdasarkan kesamaan konteks isi dokumen.
Gunakan data berikut untuk mengelompokkan file ke dalam grup yang logis.
Setiap grup harus memiliki nama, ringkasan singkat, dan daftar file.
Tulis setiap file persis seperti nilai 'Lokasi'. Setiap file hanya boleh muncul di satu grup.
File duplikat sudah ditangani terpisah; jangan membuat grup 'Duplikat'.
Berikan hasil dalam format JSON dengan skema: \
[{\"group_name\": str, \"summary\": str, \"files\": [str, ...]}].";

/// One block per file: name, relative location and summary
pub fn describe_files<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = &'a FileRecord>,
{
    records
        .into_iter()
        .map(|record| {
            let summary = if record.summary.is_empty() {
                "(tidak ada ringkasan)"
            } else {
                record.summary.as_str()
            };
            format!(
                "Nama: {}\nLokasi: {}\nRingkasan: {}\n---",
                record.file_name(),
                record.relative_path,
                summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full request text for the classifier
pub fn build_prompt(file_descriptions: &str, duplicate_summary: &str) -> String {
    format!(
        "{INSTRUCTIONS}\nBerikut daftar file:\n{file_descriptions}\n\nRingkasan duplikat:\n{duplicate_summary}"
    )
}
